//! Workspace management
//!
//! A workspace is a directory holding the content tree plus a `.silan/`
//! directory with configuration and the sync database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, Database};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not in a silan workspace. Run 'silan init' first.")]
    NotInWorkspace,
}

/// A silan workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let silan_dir = root.join(".silan");

        if !silan_dir.is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_workspace_root().ok_or(WorkspaceError::NotInWorkspace)?;
        Self::open(root)
    }

    /// Initializes a new workspace at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let silan_dir = root.join(".silan");

        fs::create_dir_all(&silan_dir).with_context(|| {
            format!("Failed to create .silan directory: {}", silan_dir.display())
        })?;

        let config_path = silan_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# silan configuration

# Content tree directory, relative to this workspace
content_dir = "content"

[sync]
# Fallback when a manifest declares no conflict strategy:
# local_wins, remote_wins, or manual
conflict_strategy = "local_wins"

# Keep database primary keys across updates so external references
# (comments, likes, views) survive
preserve_ids = true
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = silan_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Ignore the sync database (regenerated from content files)
silan.db
silan.db-wal
silan.db-shm

# Ignore the sync pass lock
sync.lock
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let workspace = Self::open(root)?;

        let content_dir = workspace.content_dir();
        fs::create_dir_all(&content_dir).with_context(|| {
            format!("Failed to create content directory: {}", content_dir.display())
        })?;

        let root_manifest = content_dir.join(".silan-cache");
        if !root_manifest.exists() {
            let manifest = r#"sync_metadata:
  item_id: content-root
  content_type: root

collections: []
"#;
            fs::write(&root_manifest, manifest).with_context(|| {
                format!("Failed to write root manifest: {}", root_manifest.display())
            })?;
        }

        Ok(workspace)
    }

    /// Returns the workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .silan directory path
    pub fn silan_dir(&self) -> PathBuf {
        self.root.join(".silan")
    }

    /// Returns the content tree root
    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.config.workspace.content_dir)
    }

    /// Returns the sync database path
    pub fn database_path(&self) -> PathBuf {
        self.silan_dir().join("silan.db")
    }

    /// Returns the sync lock path
    pub fn lock_path(&self) -> PathBuf {
        self.silan_dir().join("sync.lock")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the sync database of this workspace
    pub fn database(&self) -> crate::error::Result<Database> {
        Database::open(&self.database_path())
    }
}
