//! The `status` command

use anyhow::Result;

use crate::storage::Workspace;
use crate::sync::scan;

use super::output::Output;

pub fn run(output: &Output) -> Result<()> {
    let workspace = Workspace::open_current()?;
    let content_root = workspace.content_dir();

    let scan_result = scan(&content_root)?;
    let manifest_count = scan_result.manifests.len();

    let db = workspace.database()?;
    let counts = db.counts_by_type()?;
    let relationships = db.relationship_count()?;
    let total: i64 = counts.iter().map(|(_, n)| n).sum();

    if output.is_json() {
        let per_type: Vec<_> = counts
            .iter()
            .map(|(t, n)| serde_json::json!({ "content_type": t.to_string(), "items": n }))
            .collect();
        output.data(&serde_json::json!({
            "workspace": workspace.root().display().to_string(),
            "manifests_on_disk": manifest_count,
            "items_in_database": total,
            "relationships": relationships,
            "orphaned_markdown": scan_result.orphaned_markdown.len(),
            "by_type": per_type,
        }));
        return Ok(());
    }

    output.line(&format!("Workspace: {}", workspace.root().display()));
    output.line(&format!("Manifests on disk: {}", manifest_count));
    output.line(&format!("Items in database: {}", total));
    for (content_type, count) in &counts {
        output.line(&format!("  {:<10} {}", content_type.to_string(), count));
    }
    output.line(&format!("Relationships: {}", relationships));
    if !scan_result.orphaned_markdown.is_empty() {
        output.warning(&format!(
            "{} markdown file(s) not governed by any manifest",
            scan_result.orphaned_markdown.len()
        ));
    }

    Ok(())
}
