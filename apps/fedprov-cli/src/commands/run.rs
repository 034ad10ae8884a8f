//! Run the provisioning workflow over an entries file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use secrecy::SecretString;

use fedprov_auth::{AzureEnvironment, ClientCredentials, TokenCache};
use fedprov_devops::DevOpsClient;
use fedprov_identity::IdentityClient;

use crate::config;
use crate::error::{CliError, CliResult};
use crate::orchestrator::Orchestrator;

/// Provision identities and service connections for every entry
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the entries file
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Tenant to provision into
    #[arg(long, env = "AZURE_TENANT_ID")]
    pub tenant_id: String,

    /// Client id of the provisioning principal
    #[arg(long, env = "AZURE_CLIENT_ID")]
    pub client_id: String,

    /// Client secret of the provisioning principal
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Settle delay in seconds before requesting admin consent
    #[arg(long, default_value_t = 20)]
    pub consent_settle_secs: u64,

    /// Override the identity-platform login endpoint
    #[arg(long, hide = true)]
    pub login_url: Option<String>,

    /// Override the ARM endpoint
    #[arg(long, hide = true)]
    pub arm_url: Option<String>,

    /// Override the Microsoft Graph endpoint
    #[arg(long, hide = true)]
    pub graph_url: Option<String>,

    /// Override the Azure DevOps endpoint
    #[arg(long, hide = true)]
    pub devops_url: Option<String>,
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> CliResult<()> {
    // Whole-run fatal: the entry list must be valid before any
    // provisioning starts.
    let entries = config::load_entries(&args.file)?;
    config::validate_entries(&entries)?;

    let environment = build_environment(&args);
    let credentials = ClientCredentials {
        client_id: args.client_id.clone(),
        client_secret: SecretString::new(args.client_secret.clone()),
    };
    let tokens = Arc::new(TokenCache::new(
        credentials,
        environment.clone(),
        args.tenant_id.clone(),
    ));

    let identity = IdentityClient::new(Arc::clone(&tokens), environment.clone())?
        .with_consent_settle(Duration::from_secs(args.consent_settle_secs));

    let mut devops = DevOpsClient::new(tokens, environment)?;
    if let Some(devops_url) = &args.devops_url {
        devops = devops.with_base_url(devops_url);
    }

    let orchestrator = Orchestrator::new(identity, devops);
    let report = orchestrator.run(&entries).await;

    print!("{}", report.render());

    let failed = report.failed();
    if failed > 0 {
        return Err(CliError::EntriesFailed {
            failed,
            total: report.entries.len(),
        });
    }

    Ok(())
}

fn build_environment(args: &RunArgs) -> AzureEnvironment {
    let public = AzureEnvironment::public_cloud();
    AzureEnvironment::custom(
        args.login_url
            .clone()
            .unwrap_or_else(|| public.login_endpoint().to_string()),
        args.arm_url
            .clone()
            .unwrap_or_else(|| public.arm_endpoint().to_string()),
        args.graph_url
            .clone()
            .unwrap_or_else(|| public.graph_endpoint().to_string()),
    )
}
