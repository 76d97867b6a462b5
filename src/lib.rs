//! silan - file-based content sync for a personal portfolio
//!
//! The content tree on disk (markdown files plus `.silan-cache` YAML
//! manifests) is the source of truth; `silan db-sync` mirrors it into a
//! SQLite database, preserving row ids so external references survive.

pub mod cli;
pub mod domain;
pub mod error;
pub mod parser;
pub mod storage;
pub mod sync;

pub use domain::{ContentItem, ContentManifest, ContentType, SyncReport};
pub use error::{Result, SyncError};
