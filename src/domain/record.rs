//! Sync bookkeeping records
//!
//! One `SyncRecord` is persisted per content item. Its `content_hash`
//! matches the database row's content if and only if the two are in sync;
//! divergence from the on-disk hash is what triggers a re-sync.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::ContentType;

/// Persisted per-item bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub content_type: ContentType,

    pub item_id: String,

    /// Hash of the last successfully synced content
    pub content_hash: String,

    pub last_synced_at: DateTime<Utc>,

    /// Manifest the item was registered in at last sync
    pub source_manifest_path: PathBuf,
}

/// Classification of a parsed item against its persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Hashes match; nothing to do
    Unchanged,
    /// Hashes differ; the row needs an update
    Modified,
    /// No record exists; the item is new
    New,
    /// A database row has no matching on-disk item
    OrphanedInDb,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Unchanged => write!(f, "unchanged"),
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::New => write!(f, "new"),
            ChangeKind::OrphanedInDb => write!(f, "orphaned_in_db"),
        }
    }
}
