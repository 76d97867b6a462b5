//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{status_cmd, sync_cmd, validate_cmd};
use crate::domain::{ConflictStrategy, ContentType};
use crate::storage::Workspace;

#[derive(Parser)]
#[command(name = "silan")]
#[command(author, version, about = "File-based content sync for a portfolio database")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new silan workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Sync the content tree into the database
    DbSync {
        /// Re-sync everything, ignoring change detection
        #[arg(long)]
        force: bool,

        /// Go through every phase but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Restrict the pass to one content type
        /// (blog, project, idea, episode, resume)
        #[arg(long = "type", value_name = "TYPE")]
        content_type: Option<ContentType>,

        /// Conflict strategy override
        /// (local-wins, remote-wins, manual)
        #[arg(long)]
        conflict_strategy: Option<ConflictStrategy>,
    },

    /// Check manifests and content files without writing anything
    Validate {
        /// Restrict the check to one content type
        #[arg(long = "type", value_name = "TYPE")]
        content_type: Option<ContentType>,
    },

    /// Show workspace and database overview
    Status,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing workspace at: {}", path));
            let workspace = Workspace::init(&path)?;
            output.success(&format!(
                "Initialized silan workspace at {}",
                workspace.root().display()
            ));
        }

        Commands::DbSync {
            force,
            dry_run,
            content_type,
            conflict_strategy,
        } => sync_cmd::run(&output, force, dry_run, content_type, conflict_strategy)?,

        Commands::Validate { content_type } => validate_cmd::run(&output, content_type)?,

        Commands::Status => status_cmd::run(&output)?,
    }

    Ok(())
}
