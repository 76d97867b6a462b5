//! silan CLI - content tree to database synchronization

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = silan_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
