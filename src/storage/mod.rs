//! # Storage Layer
//!
//! Persistence layer for the sync engine.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Content items | SQLite | `.silan/silan.db` |
//! | Sync records | SQLite | `.silan/silan.db` |
//! | Config | TOML | `.silan/config.toml` |
//! | Pass lock | flock file | `.silan/sync.lock` |
//!
//! ## Workspace Structure
//!
//! ```text
//! workspace/
//! ├── content/              # Content tree (manifests + markdown)
//! │   ├── .silan-cache      # Root manifest
//! │   ├── blog/
//! │   ├── projects/
//! │   └── ...
//! └── .silan/
//!     ├── config.toml       # Workspace configuration
//!     ├── silan.db          # Sync database (regenerable)
//!     ├── sync.lock         # Held for the duration of a pass
//!     └── .gitignore        # Ignores the database and lock
//! ```
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point for a silan workspace
//! - [`Database`] - SQLite persistence for items and relationships
//! - [`Config`] - Workspace and global configuration

mod config;
mod database;
mod workspace;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, SyncConfig, WorkspaceConfig};
pub use database::Database;
pub use workspace::{Workspace, WorkspaceError};
