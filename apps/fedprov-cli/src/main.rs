//! fedprov - provision federated workload identities for CI/CD pipelines.
//!
//! For each declared subscription the tool:
//! - creates or reuses a workload identity named `app-<subscription>-devops`
//!   and strips any password credentials from it
//! - grants the identity Owner at subscription scope
//! - registers Directory.Read.All and requests admin consent (best-effort)
//! - optionally creates an Azure DevOps service connection bound to the
//!   identity via OIDC workload-identity federation

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fedprov_cli::commands;
use fedprov_cli::error::CliResult;

/// fedprov - federated workload-identity provisioning
#[derive(Parser)]
#[command(name = "fedprov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision all entries from a file
    Run(commands::run::RunArgs),

    /// Validate an entries file without provisioning
    Validate(commands::validate::ValidateArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(&args),
    }
}
