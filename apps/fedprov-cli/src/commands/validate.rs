//! Validate an entries file without provisioning anything.

use std::path::PathBuf;

use clap::Args;

use crate::config;
use crate::error::CliResult;

/// Validate a provisioning entries file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the entries file
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,
}

/// Execute the validate command.
pub fn execute(args: &ValidateArgs) -> CliResult<()> {
    let entries = config::load_entries(&args.file)?;
    config::validate_entries(&entries)?;

    println!(
        "{}: {} entries, {} with service connections",
        args.file.display(),
        entries.len(),
        entries
            .iter()
            .filter(|e| e.create_service_connection)
            .count()
    );

    Ok(())
}
