//! # Sync Engine
//!
//! Orchestrates a pass over the content tree: scan, parse, detect
//! changes, persist, resolve relationships. Entry point is
//! [`execute_sync`]; everything else here is the machinery of one phase.

mod detect;
mod engine;
mod lock;
mod resolve;
mod scanner;

pub use detect::{classify, fast_path_unchanged, Detection};
pub use engine::{execute_sync, SyncOptions};
pub use lock::SyncLock;
pub use resolve::{resolve_links, ResolvedLinks};
pub use scanner::{scan, FoundManifest, ScanResult};
