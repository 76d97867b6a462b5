//! Configuration handling
//!
//! Configuration is stored in `.silan/config.toml` (workspace) and
//! `~/.config/silan/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ConflictStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Default sync behavior, overridable per manifest and per invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Fallback conflict strategy when a manifest declares none
    pub conflict_strategy: ConflictStrategy,

    /// Keep database primary keys across updates
    pub preserve_ids: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            conflict_strategy: ConflictStrategy::LocalWins,
            preserve_ids: true,
        }
    }
}

/// Workspace-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Content tree directory, relative to the workspace root
    pub content_dir: String,

    /// Sync defaults
    pub sync: SyncConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            sync: SyncConfig::default(),
        }
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Combined configuration (global + workspace)
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub global: GlobalConfig,
    pub workspace_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (workspace, workspace_root) = Self::load_workspace()?;

        Ok(Self {
            workspace,
            global,
            workspace_root,
        })
    }

    /// Loads configuration for a specific workspace
    pub fn for_workspace(workspace_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let workspace = Self::load_workspace_config(workspace_root)?;

        Ok(Self {
            workspace,
            global,
            workspace_root: Some(workspace_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "silan", "silan-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    fn load_workspace() -> Result<(WorkspaceConfig, Option<PathBuf>)> {
        match Self::find_workspace_root() {
            Some(root) => {
                let config = Self::load_workspace_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((WorkspaceConfig::default(), None)),
        }
    }

    fn load_workspace_config(workspace_root: &Path) -> Result<WorkspaceConfig> {
        let config_path = workspace_root.join(".silan").join("config.toml");

        if !config_path.exists() {
            return Ok(WorkspaceConfig::default());
        }

        let content = fs::read_to_string(&config_path).with_context(|| {
            format!("Failed to read workspace config: {}", config_path.display())
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse workspace config")
    }

    /// Finds the workspace root by looking for a `.silan/` directory
    pub fn find_workspace_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(".silan").is_dir() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if we're inside a workspace
    pub fn is_in_workspace(&self) -> bool {
        self.workspace_root.is_some()
    }

    /// Returns the workspace root, or an error if outside one
    pub fn require_workspace_root(&self) -> Result<&Path> {
        self.workspace_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a silan workspace. Run 'silan init' first."))
    }

    /// Saves the workspace configuration
    pub fn save_workspace(&self) -> Result<()> {
        let root = self.require_workspace_root()?;
        let config_path = root.join(".silan").join("config.toml");

        let content = toml::to_string_pretty(&self.workspace)
            .context("Failed to serialize workspace config")?;

        fs::write(&config_path, content).with_context(|| {
            format!("Failed to write workspace config: {}", config_path.display())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config {
            workspace: WorkspaceConfig::default(),
            global: GlobalConfig::default(),
            workspace_root: None,
        };

        assert_eq!(config.workspace.content_dir, "content");
        assert_eq!(
            config.workspace.sync.conflict_strategy,
            ConflictStrategy::LocalWins
        );
        assert!(config.workspace.sync.preserve_ids);
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_workspace_config() {
        let toml = r#"
content_dir = "site-content"

[sync]
conflict_strategy = "manual"
preserve_ids = false
"#;

        let config: WorkspaceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.content_dir, "site-content");
        assert_eq!(config.sync.conflict_strategy, ConflictStrategy::Manual);
        assert!(!config.sync.preserve_ids);
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"default_format = "json""#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn config_not_in_workspace() {
        let config = Config {
            workspace: WorkspaceConfig::default(),
            global: GlobalConfig::default(),
            workspace_root: None,
        };

        assert!(!config.is_in_workspace());
        assert!(config.require_workspace_root().is_err());
    }
}
