//! The `validate` command
//!
//! Parses every manifest and content file without touching the database,
//! listing each problem. Exits nonzero when anything is invalid.

use anyhow::{bail, Result};

use crate::domain::{ContentType, ManifestLevel};
use crate::parser;
use crate::storage::Workspace;
use crate::sync::scan;

use super::output::Output;

pub fn run(output: &Output, content_type: Option<ContentType>) -> Result<()> {
    let workspace = Workspace::open_current()?;
    let content_root = workspace.content_dir();

    let scan_result = scan(&content_root)?;
    let mut problems: Vec<String> = Vec::new();
    let mut checked = 0usize;

    for found in &scan_result.manifests {
        let manifest = match parser::parse_manifest(&content_root, &found.path) {
            Ok(m) => m,
            Err(e) => {
                problems.push(format!("{}: {}", found.path.display(), e));
                continue;
            }
        };

        let item_type = manifest.manifest_type.content_type();
        if let Some(filter) = content_type {
            if item_type != Some(filter) {
                continue;
            }
        }

        // Item manifests (and the resume manifest) get their files
        // loaded and parsed too.
        let is_item = manifest.level() == ManifestLevel::Item
            || manifest.payload.files().is_some();
        if is_item {
            checked += 1;
            let parsed = parser::load_source(&content_root, &manifest, None)
                .and_then(parser::parse_item);
            if let Err(e) = parsed {
                problems.push(format!("{}: {}", manifest.item_id, e));
            }
        }
    }

    for orphan in &scan_result.orphaned_markdown {
        output.warning(&format!(
            "markdown file '{}' has no manifest governing it",
            orphan.display()
        ));
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "checked": checked,
            "problems": problems,
            "orphaned_markdown": scan_result.orphaned_markdown,
        }));
    } else {
        for problem in &problems {
            output.error(problem);
        }
        output.line(&format!(
            "Validated {} item(s), {} problem(s)",
            checked,
            problems.len()
        ));
    }

    if !problems.is_empty() {
        bail!("validation found {} problem(s)", problems.len());
    }
    Ok(())
}
