//! The `db-sync` command

use anyhow::{bail, Result};

use crate::domain::{ConflictStrategy, ContentType, SyncReport};
use crate::storage::Workspace;
use crate::sync::{execute_sync, SyncOptions};

use super::output::Output;

pub fn run(
    output: &Output,
    force: bool,
    dry_run: bool,
    content_type: Option<ContentType>,
    conflict_strategy: Option<ConflictStrategy>,
) -> Result<()> {
    let workspace = Workspace::open_current()?;
    output.verbose_ctx(
        "db-sync",
        &format!("Workspace root: {}", workspace.root().display()),
    );

    let options = SyncOptions {
        force,
        dry_run,
        content_type,
        conflict_strategy,
    };

    let report = execute_sync(&workspace, &options)?;
    print_report(output, &report);

    if !report.is_success() {
        bail!("{} item(s) failed to sync", report.failed.len());
    }
    Ok(())
}

fn print_report(output: &Output, report: &SyncReport) {
    if output.is_json() {
        output.data(report);
        return;
    }

    output.line(&report.summary());

    for id in &report.created {
        output.line(&format!("  created   {}", id));
    }
    for id in &report.updated {
        output.line(&format!("  updated   {}", id));
    }
    if output.is_verbose() {
        for id in &report.skipped {
            output.line(&format!("  unchanged {}", id));
        }
    }
    for id in &report.conflicts {
        output.line(&format!("  conflict  {}", id));
    }
    for id in &report.orphaned_in_db {
        output.line(&format!("  orphaned  {}", id));
    }
    for failure in &report.failed {
        output.error(&format!("{}: {}", failure.item_id, failure.message));
    }
    for warning in &report.warnings {
        match &warning.item_id {
            Some(id) => output.warning(&format!("{}: {}", id, warning.message)),
            None => output.warning(&warning.message),
        }
    }
}
