//! Change detection
//!
//! Compares what is on disk with what the database remembers. The
//! content hash is the ground truth; manifest timestamps feed an
//! optional fast path that skips re-reading files that cannot have
//! changed, and flag conflicts when a modified manifest predates the
//! recorded sync.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::{ChangeKind, ContentManifest, SyncRecord};

/// Outcome of classifying one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub kind: ChangeKind,

    /// Both disk and database changed since this manifest last synced
    pub conflict: bool,
}

/// Classifies one item from its freshly computed hash and the stored
/// sync record.
pub fn classify(
    computed_hash: &str,
    manifest: &ContentManifest,
    record: Option<&SyncRecord>,
) -> Detection {
    let record = match record {
        Some(r) => r,
        None => {
            return Detection {
                kind: ChangeKind::New,
                conflict: false,
            }
        }
    };

    if record.content_hash == computed_hash {
        return Detection {
            kind: ChangeKind::Unchanged,
            conflict: false,
        };
    }

    // Disk changed. Two signals mark the database side as having moved
    // as well: the hash the manifest remembers from its own last sync no
    // longer matches the database, or the manifest's own update time
    // predates the recorded sync (the row was written after the manifest
    // last saw it).
    let hash_diverged = matches!(
        &manifest.last_file_hash,
        Some(remembered) if remembered != &record.content_hash
    );
    let stale_timestamp = matches!(
        manifest.last_update_time,
        Some(updated) if updated < record.last_synced_at
    );

    Detection {
        kind: ChangeKind::Modified,
        conflict: hash_diverged || stale_timestamp,
    }
}

/// True when the item can be skipped without reading its files.
///
/// Requires the manifest's remembered hash to match the database and no
/// registered file modified after the last sync. Any missing signal
/// (no timestamps, unreadable metadata) disables the fast path.
pub fn fast_path_unchanged(
    content_root: &Path,
    manifest: &ContentManifest,
    record: &SyncRecord,
) -> bool {
    let remembered = match &manifest.last_file_hash {
        Some(h) => h,
        None => return false,
    };
    if remembered != &record.content_hash {
        return false;
    }

    let registrations = match manifest.payload.files() {
        Some(f) => f,
        None => return false,
    };

    let dir = manifest.directory();
    for registration in registrations {
        let path = content_root.join(&dir).join(&registration.path);
        match file_mtime(&path) {
            Some(mtime) if mtime <= record.last_synced_at => {}
            _ => return false,
        }
    }

    true
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ContentType, ItemInfo, ManifestPayload, ManifestType, SyncSettings,
    };

    fn manifest(last_file_hash: Option<&str>) -> ContentManifest {
        ContentManifest {
            path: "blog/x/.silan-cache".into(),
            item_id: "x".into(),
            manifest_type: ManifestType::BlogPost,
            last_update_time: None,
            last_file_hash: last_file_hash.map(String::from),
            sync_enabled: true,
            settings: SyncSettings::default(),
            related_content: vec![],
            payload: ManifestPayload::BlogPost {
                info: ItemInfo::default(),
                files: vec![],
            },
        }
    }

    fn record(hash: &str) -> SyncRecord {
        SyncRecord {
            content_type: ContentType::Blog,
            item_id: "x".into(),
            content_hash: hash.into(),
            last_synced_at: Utc::now(),
            source_manifest_path: "blog/x/.silan-cache".into(),
        }
    }

    #[test]
    fn no_record_is_new() {
        let d = classify("abc", &manifest(None), None);
        assert_eq!(d.kind, ChangeKind::New);
        assert!(!d.conflict);
    }

    #[test]
    fn matching_hash_is_unchanged() {
        let d = classify("abc", &manifest(Some("abc")), Some(&record("abc")));
        assert_eq!(d.kind, ChangeKind::Unchanged);
    }

    #[test]
    fn differing_hash_is_modified() {
        let d = classify("def", &manifest(Some("abc")), Some(&record("abc")));
        assert_eq!(d.kind, ChangeKind::Modified);
        assert!(!d.conflict);
    }

    #[test]
    fn divergence_on_both_sides_is_a_conflict() {
        // Manifest remembers "abc", database now holds "db-side", disk
        // computes "def": all three differ.
        let d = classify("def", &manifest(Some("abc")), Some(&record("db-side")));
        assert_eq!(d.kind, ChangeKind::Modified);
        assert!(d.conflict);
    }

    #[test]
    fn stale_manifest_timestamp_is_a_conflict() {
        // Manifest still remembers the database hash, but its own update
        // time is older than the recorded sync: the row was written by
        // someone else in between.
        let mut m = manifest(Some("db-hash"));
        m.last_update_time = Some(Utc::now() - chrono::Duration::days(1));

        let d = classify("new-disk-hash", &m, Some(&record("db-hash")));
        assert_eq!(d.kind, ChangeKind::Modified);
        assert!(d.conflict);
    }

    #[test]
    fn fresh_manifest_timestamp_does_not_conflict() {
        let mut m = manifest(Some("db-hash"));
        m.last_update_time = Some(Utc::now() + chrono::Duration::hours(1));

        let d = classify("new-disk-hash", &m, Some(&record("db-hash")));
        assert_eq!(d.kind, ChangeKind::Modified);
        assert!(!d.conflict);
    }

    #[test]
    fn unknown_manifest_hash_never_conflicts() {
        let d = classify("def", &manifest(None), Some(&record("db-side")));
        assert_eq!(d.kind, ChangeKind::Modified);
        assert!(!d.conflict);
    }
}
