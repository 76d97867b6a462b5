//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create the workspace skeleton |
//! | `db-sync` | Sync the content tree into the database |
//! | `validate` | Check manifests and files without writing |
//! | `status` | Workspace and database overview |
//!
//! All commands support `--format text|json` and `--verbose`.
//! Entry point is [`run()`].

mod app;
mod output;
mod status_cmd;
mod sync_cmd;
mod validate_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
