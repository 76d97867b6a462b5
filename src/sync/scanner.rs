//! Content tree scanner
//!
//! Walks the content root collecting every `.silan-cache` manifest and
//! every markdown file, without parsing either. A failure to read the
//! root itself is fatal; a failure inside a subdirectory is recorded as
//! a warning so one unreadable directory cannot sink the pass.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::SyncWarning;
use crate::error::{Result, SyncError};
use crate::parser::MANIFEST_FILE;

/// A discovered manifest, located but not yet parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundManifest {
    /// Path relative to the content root
    pub path: PathBuf,

    /// Directory depth below the root (0 = root manifest)
    pub depth: usize,
}

/// Snapshot of one walk over the content tree
#[derive(Debug, Default)]
pub struct ScanResult {
    /// All manifests, shallowest first, path-ordered within a depth
    pub manifests: Vec<FoundManifest>,

    /// Markdown files with no manifest anywhere in their directory chain
    pub orphaned_markdown: Vec<PathBuf>,

    /// Non-fatal problems hit during the walk
    pub warnings: Vec<SyncWarning>,
}

impl ScanResult {
    /// The root-level manifest, if the tree has one
    pub fn root_manifest(&self) -> Option<&FoundManifest> {
        self.manifests.iter().find(|m| m.depth == 0)
    }
}

/// Walks `content_root` and returns everything sync needs to look at.
pub fn scan(content_root: &Path) -> Result<ScanResult> {
    // The root must be readable; nothing can proceed otherwise.
    let root_entries = fs::read_dir(content_root).map_err(|e| SyncError::fs(content_root, &e))?;

    let mut result = ScanResult::default();
    let mut manifest_dirs: HashSet<PathBuf> = HashSet::new();
    let mut markdown: Vec<PathBuf> = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();

    if let Ok(canonical) = content_root.canonicalize() {
        visited.insert(canonical);
    }

    walk_entries(
        content_root,
        Path::new(""),
        0,
        root_entries,
        &mut result,
        &mut manifest_dirs,
        &mut markdown,
        &mut visited,
    );

    result
        .manifests
        .sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.path.cmp(&b.path)));

    // A markdown file is orphaned when no directory on its chain up to the
    // root carries a manifest.
    markdown.sort();
    for md in markdown {
        let governed = md
            .ancestors()
            .skip(1)
            .any(|dir| manifest_dirs.contains(dir));
        if !governed {
            result.orphaned_markdown.push(md);
        }
    }

    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn walk_entries(
    content_root: &Path,
    rel_dir: &Path,
    depth: usize,
    entries: fs::ReadDir,
    result: &mut ScanResult,
    manifest_dirs: &mut HashSet<PathBuf>,
    markdown: &mut Vec<PathBuf>,
    visited: &mut HashSet<PathBuf>,
) {
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                result.warnings.push(SyncWarning::new(format!(
                    "skipping unreadable entry in '{}': {}",
                    rel_dir.display(),
                    e
                )));
                continue;
            }
        };

        let name = entry.file_name();
        let rel_path = rel_dir.join(&name);
        let abs_path = entry.path();

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                result.warnings.push(SyncWarning::new(format!(
                    "skipping '{}': {}",
                    rel_path.display(),
                    e
                )));
                continue;
            }
        };

        if file_type.is_dir() || file_type.is_symlink() {
            // Canonical path dedup stops symlink cycles.
            let canonical = match abs_path.canonicalize() {
                Ok(p) => p,
                Err(e) => {
                    result.warnings.push(SyncWarning::new(format!(
                        "skipping '{}': {}",
                        rel_path.display(),
                        e
                    )));
                    continue;
                }
            };
            if !canonical.is_dir() {
                // Symlink to a file; treat it like the file it points at.
                record_file(&rel_path, depth, result, manifest_dirs, markdown, rel_dir);
                continue;
            }
            if !visited.insert(canonical) {
                result.warnings.push(SyncWarning::new(format!(
                    "skipping '{}': directory already visited",
                    rel_path.display()
                )));
                continue;
            }
            match fs::read_dir(&abs_path) {
                Ok(sub) => walk_entries(
                    content_root,
                    &rel_path,
                    depth + 1,
                    sub,
                    result,
                    manifest_dirs,
                    markdown,
                    visited,
                ),
                Err(e) => {
                    result.warnings.push(SyncWarning::new(format!(
                        "skipping unreadable directory '{}': {}",
                        rel_path.display(),
                        e
                    )));
                }
            }
        } else {
            record_file(&rel_path, depth, result, manifest_dirs, markdown, rel_dir);
        }
    }
}

fn record_file(
    rel_path: &Path,
    depth: usize,
    result: &mut ScanResult,
    manifest_dirs: &mut HashSet<PathBuf>,
    markdown: &mut Vec<PathBuf>,
    rel_dir: &Path,
) {
    let name = match rel_path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return,
    };

    if name == MANIFEST_FILE {
        result.manifests.push(FoundManifest {
            path: rel_path.to_path_buf(),
            depth,
        });
        manifest_dirs.insert(rel_dir.to_path_buf());
    } else if name.ends_with(".md") {
        markdown.push(rel_path.to_path_buf());
    }
}
