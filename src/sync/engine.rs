//! Sync orchestration
//!
//! One pass runs in phases: scan the content tree, parse manifests,
//! detect changes, parse changed items, persist them one transaction
//! each, then resolve and persist relationships. A failure in one item
//! is recorded and the pass moves on; only a failure to read the
//! content root itself aborts the pass.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::domain::{
    ChangeKind, ConflictStrategy, ContentItem, ContentManifest, ContentType, ManifestLevel,
    RegistryEntry, SyncReport, SyncWarning,
};
use crate::error::Result;
use crate::parser;
use crate::storage::Workspace;

use super::detect;
use super::lock::SyncLock;
use super::resolve;
use super::scanner;

/// Knobs for one sync pass
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Re-sync everything, ignoring change detection
    pub force: bool,

    /// Go through every phase but write nothing
    pub dry_run: bool,

    /// Restrict the pass to one content type
    pub content_type: Option<ContentType>,

    /// Override the conflict strategy of every manifest
    pub conflict_strategy: Option<ConflictStrategy>,
}

/// Runs one full sync pass over the workspace.
pub fn execute_sync(workspace: &Workspace, options: &SyncOptions) -> Result<SyncReport> {
    let _lock = SyncLock::acquire(&workspace.lock_path())?;

    let content_root = workspace.content_dir();
    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..Default::default()
    };

    // Phase 1: scan
    let mut scan = scanner::scan(&content_root)?;
    for warning in scan.warnings.drain(..) {
        report.warn(warning);
    }
    for orphan in &scan.orphaned_markdown {
        report.warn(SyncWarning::new(format!(
            "markdown file '{}' has no manifest governing it",
            orphan.display()
        )));
    }
    if scan.root_manifest().is_none() {
        report.warn(SyncWarning::new("content tree has no root manifest"));
    }

    // Phase 2: parse manifests. A bad manifest fails its own item (or
    // collection) and nothing else.
    let mut collections: Vec<ContentManifest> = Vec::new();
    let mut items: Vec<ContentManifest> = Vec::new();

    for found in &scan.manifests {
        let manifest = match parser::parse_manifest(&content_root, &found.path) {
            Ok(m) => m,
            Err(e) => {
                // Validation errors know their item; only a YAML-level
                // failure has to fall back to the manifest path.
                let id = e
                    .item_id()
                    .map(str::to_string)
                    .unwrap_or_else(|| found.path.display().to_string());
                report.fail(id, e.to_string());
                continue;
            }
        };

        match manifest.level() {
            ManifestLevel::Root => {}
            ManifestLevel::Collection => {
                // The resume manifest doubles as its own item.
                if manifest.payload.files().is_some() {
                    items.push(manifest);
                } else {
                    collections.push(manifest);
                }
            }
            ManifestLevel::Item => items.push(manifest),
        }
    }

    let registry = registry_index(&collections);
    check_registrations(&collections, &items, &mut report);

    let mut db = workspace.database()?;
    let records = db.load_sync_records()?;
    let mut known = db.known_items()?;

    // Phase 3 + 4: detect changes, parse and persist changed items
    let mut written: Vec<ContentItem> = Vec::new();
    let mut seen_on_disk: HashSet<(ContentType, String)> = HashSet::new();

    let fallback_strategy = workspace.config().workspace.sync.conflict_strategy;

    for manifest in &items {
        let content_type = match manifest.manifest_type.content_type() {
            Some(t) => t,
            None => continue,
        };
        if let Some(filter) = options.content_type {
            if content_type != filter {
                continue;
            }
        }

        seen_on_disk.insert((content_type, manifest.item_id.clone()));

        if !manifest.sync_enabled {
            report.skipped.push(manifest.item_id.clone());
            continue;
        }

        let record = records.get(&(content_type, manifest.item_id.clone()));

        if !options.force {
            if let Some(record) = record {
                if detect::fast_path_unchanged(&content_root, manifest, record) {
                    report.skipped.push(manifest.item_id.clone());
                    continue;
                }
            }
        }

        let entry = registry.get(&(content_type, manifest.item_id.clone())).copied();
        let source = match parser::load_source(&content_root, manifest, entry) {
            Ok(s) => s,
            Err(e) => {
                report.fail(manifest.item_id.clone(), e.to_string());
                continue;
            }
        };

        let detection = detect::classify(&source.content_hash, manifest, record);
        if detection.kind == ChangeKind::Unchanged && !options.force {
            report.skipped.push(manifest.item_id.clone());
            continue;
        }

        if detection.conflict {
            // Invocation flag beats the manifest, which beats the
            // workspace default.
            let strategy = options
                .conflict_strategy
                .or(manifest.settings.conflict_resolution)
                .unwrap_or(fallback_strategy);
            match strategy {
                ConflictStrategy::LocalWins => {
                    report.conflicts.push(manifest.item_id.clone());
                }
                ConflictStrategy::RemoteWins => {
                    report.conflicts.push(manifest.item_id.clone());
                    report.skipped.push(manifest.item_id.clone());
                    continue;
                }
                ConflictStrategy::Manual => {
                    report.conflicts.push(manifest.item_id.clone());
                    report.warn(SyncWarning::for_item(
                        &manifest.item_id,
                        "both disk and database changed since last sync, held for review",
                    ));
                    continue;
                }
            }
        }

        let item = match parser::parse_item(source) {
            Ok(i) => i,
            Err(e) => {
                report.fail(manifest.item_id.clone(), e.to_string());
                continue;
            }
        };

        if options.dry_run {
            // The report must match what a real pass would produce, so
            // the item joins the known set for relationship resolution
            // even though nothing is written.
            known.insert((item.content_type, item.id.clone()));
            match detection.kind {
                ChangeKind::New => report.created.push(item.id.clone()),
                _ => report.updated.push(item.id.clone()),
            }
            written.push(item);
            continue;
        }

        let persisted = retry_once(|| {
            db.write_item(
                &item,
                &manifest.path,
                manifest.settings.preserve_ids,
                manifest.settings.merge_strategy,
            )
        });
        match persisted {
            Ok(()) => {
                known.insert((item.content_type, item.id.clone()));
                match detection.kind {
                    ChangeKind::New => report.created.push(item.id.clone()),
                    _ => report.updated.push(item.id.clone()),
                }
                written.push(item);
            }
            Err(e) => report.fail(item.id.clone(), e.to_string()),
        }
    }

    // Phase 5: items the database remembers that are gone from disk are
    // reported, never deleted.
    for (content_type, item_id) in records.keys() {
        if let Some(filter) = options.content_type {
            if *content_type != filter {
                continue;
            }
        }
        if !seen_on_disk.contains(&(*content_type, item_id.clone())) {
            report.orphaned_in_db.push(item_id.clone());
            report.warn(SyncWarning::for_item(
                item_id,
                "present in database but missing from disk, kept",
            ));
        }
    }
    report.orphaned_in_db.sort();

    // Phase 6: resolve relationships against everything now known
    let resolved = resolve::resolve_links(&written, &known);
    for warning in resolved.warnings {
        report.warn(warning);
    }
    if !options.dry_run && !written.is_empty() {
        let sources: Vec<(ContentType, String)> = written
            .iter()
            .map(|i| (i.content_type, i.id.clone()))
            .collect();
        db.replace_relationships(&sources, &resolved.links)?;
    }

    Ok(report)
}

const WRITE_RETRY_PAUSE: Duration = Duration::from_millis(50);

/// Runs a database write, retrying once after a short pause. The
/// connection's busy timeout already absorbs lock contention; this
/// covers other transient failures.
fn retry_once<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    if let Ok(value) = op() {
        return Ok(value);
    }
    std::thread::sleep(WRITE_RETRY_PAUSE);
    op()
}

/// Indexes collection registry entries by (type, item id).
fn registry_index(
    collections: &[ContentManifest],
) -> HashMap<(ContentType, String), &RegistryEntry> {
    let mut index = HashMap::new();
    for manifest in collections {
        let content_type = match manifest.manifest_type.content_type() {
            Some(t) => t,
            None => continue,
        };
        if let Some(entries) = manifest.payload.registry() {
            for entry in entries {
                index.insert((content_type, entry.id.clone()), entry);
            }
        }
    }
    index
}

/// Warns about registry entries without manifests and manifests without
/// registry entries.
fn check_registrations(
    collections: &[ContentManifest],
    items: &[ContentManifest],
    report: &mut SyncReport,
) {
    let on_disk: HashSet<(Option<ContentType>, &str)> = items
        .iter()
        .map(|m| (m.manifest_type.content_type(), m.item_id.as_str()))
        .collect();

    let mut registered: HashSet<(Option<ContentType>, String)> = HashSet::new();

    for collection in collections {
        let content_type = collection.manifest_type.content_type();
        if let Some(entries) = collection.payload.registry() {
            for entry in entries {
                registered.insert((content_type, entry.id.clone()));
                if !on_disk.contains(&(content_type, entry.id.as_str())) {
                    report.warn(SyncWarning::for_item(
                        &entry.id,
                        format!(
                            "registered in '{}' but has no item manifest",
                            collection.path.display()
                        ),
                    ));
                }
            }
        }
    }

    for item in items {
        let content_type = item.manifest_type.content_type();
        // The resume manifest registers itself.
        if item.level() == ManifestLevel::Collection {
            continue;
        }
        let has_collection = collections
            .iter()
            .any(|c| c.manifest_type.content_type() == content_type);
        if has_collection && !registered.contains(&(content_type, item.item_id.clone())) {
            report.warn(SyncWarning::for_item(
                &item.item_id,
                "item manifest exists but is not registered in its collection",
            ));
        }
    }
}
