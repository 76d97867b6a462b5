//! Sync pass report
//!
//! The report is the single source of truth for what a pass did. Failures
//! and warnings carry item ids and messages an operator can act on, never
//! a bare stack trace.

use serde::{Deserialize, Serialize};

/// A per-item failure recorded during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_id: String,
    pub message: String,
}

/// A non-fatal condition worth surfacing to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWarning {
    /// Item id when the warning is item-scoped
    pub item_id: Option<String>,
    pub message: String,
}

impl SyncWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            item_id: None,
            message: message.into(),
        }
    }

    pub fn for_item(item_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            message: message.into(),
        }
    }
}

/// Outcome of one complete synchronization pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Items inserted for the first time
    pub created: Vec<String>,

    /// Items whose rows were updated
    pub updated: Vec<String>,

    /// Items left untouched (unchanged, or remote-wins conflicts)
    pub skipped: Vec<String>,

    /// Items held for operator review under the manual conflict strategy
    pub conflicts: Vec<String>,

    /// Items that failed parsing, validation, or persistence
    pub failed: Vec<ItemFailure>,

    /// Database rows whose on-disk item disappeared
    pub orphaned_in_db: Vec<String>,

    /// Dangling references, symlink loops, orphaned files, held conflicts
    pub warnings: Vec<SyncWarning>,

    /// True when no writes were performed
    pub dry_run: bool,
}

impl SyncReport {
    /// True when every discovered item synced (or was legitimately skipped)
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of items this pass looked at
    pub fn total(&self) -> usize {
        self.created.len()
            + self.updated.len()
            + self.skipped.len()
            + self.conflicts.len()
            + self.failed.len()
    }

    /// Records a failure
    pub fn fail(&mut self, item_id: impl Into<String>, message: impl Into<String>) {
        self.failed.push(ItemFailure {
            item_id: item_id.into(),
            message: message.into(),
        });
    }

    /// Records a warning
    pub fn warn(&mut self, warning: SyncWarning) {
        self.warnings.push(warning);
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} skipped, {} conflicts, {} failed, {} warnings{}",
            self.created.len(),
            self.updated.len(),
            self.skipped.len(),
            self.conflicts.len(),
            self.failed.len(),
            self.warnings.len(),
            if self.dry_run { " (dry run)" } else { "" },
        )
    }
}
