//! Azure cloud endpoint configuration.

/// Application ID of the Azure DevOps resource in Entra ID. Tokens for the
/// DevOps REST API must be requested against this fixed resource.
pub const DEVOPS_RESOURCE_ID: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Endpoint set for an Azure cloud.
///
/// Carried explicitly through every client instead of being read from
/// ambient state, so tests and sovereign-cloud deployments can substitute
/// their own endpoints.
#[derive(Debug, Clone)]
pub struct AzureEnvironment {
    login_endpoint: String,
    arm_endpoint: String,
    graph_endpoint: String,
}

impl AzureEnvironment {
    /// The Azure public (commercial) cloud.
    #[must_use]
    pub fn public_cloud() -> Self {
        Self {
            login_endpoint: "https://login.microsoftonline.com".to_string(),
            arm_endpoint: "https://management.azure.com".to_string(),
            graph_endpoint: "https://graph.microsoft.com".to_string(),
        }
    }

    /// An environment with custom endpoints (tests, sovereign clouds).
    #[must_use]
    pub fn custom(
        login_endpoint: impl Into<String>,
        arm_endpoint: impl Into<String>,
        graph_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            login_endpoint: trim_trailing_slash(login_endpoint.into()),
            arm_endpoint: trim_trailing_slash(arm_endpoint.into()),
            graph_endpoint: trim_trailing_slash(graph_endpoint.into()),
        }
    }

    /// Base URL of the identity-platform token service.
    #[must_use]
    pub fn login_endpoint(&self) -> &str {
        &self.login_endpoint
    }

    /// Base URL of Azure Resource Manager.
    #[must_use]
    pub fn arm_endpoint(&self) -> &str {
        &self.arm_endpoint
    }

    /// Base URL of Microsoft Graph.
    #[must_use]
    pub fn graph_endpoint(&self) -> &str {
        &self.graph_endpoint
    }

    /// OAuth2 scope for Azure Resource Manager calls.
    #[must_use]
    pub fn arm_scope(&self) -> String {
        format!("{}/.default", self.arm_endpoint)
    }

    /// OAuth2 scope for Microsoft Graph calls.
    #[must_use]
    pub fn graph_scope(&self) -> String {
        format!("{}/.default", self.graph_endpoint)
    }

    /// OAuth2 scope for Azure DevOps REST calls.
    #[must_use]
    pub fn devops_scope(&self) -> String {
        format!("{DEVOPS_RESOURCE_ID}/.default")
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}
