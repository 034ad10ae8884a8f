//! Azure DevOps REST client.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use fedprov_auth::{AzureEnvironment, TokenCache};

use crate::{DevOpsError, DevOpsResult, ProjectReference, ServiceEndpoint};

/// Authorization scheme for credential-less (OIDC federated) endpoints.
pub const WORKLOAD_IDENTITY_FEDERATION_SCHEME: &str = "WorkloadIdentityFederation";

const DEFAULT_BASE_URL: &str = "https://dev.azure.com";
const PROJECTS_API_VERSION: &str = "7.0";
const ENDPOINTS_API_VERSION: &str = "7.0-preview.4";

/// Inputs for creating a federated service endpoint.
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    /// Endpoint name (`conn-<spDisplayName>`).
    pub name: String,
    /// Target subscription id.
    pub subscription_id: String,
    /// Target subscription display name.
    pub subscription_name: String,
    /// Tenant of the workload identity.
    pub tenant_id: String,
    /// Application (client) id of the workload identity.
    pub service_principal_id: String,
    /// Project the endpoint is created in.
    pub project: ProjectReference,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointDefinition {
    name: String,
    #[serde(rename = "type")]
    endpoint_type: String,
    url: String,
    authorization: AuthorizationDefinition,
    data: EndpointData,
    is_shared: bool,
    is_ready: bool,
    service_endpoint_project_references: Vec<ProjectEndpointReference>,
}

#[derive(Debug, Serialize)]
struct AuthorizationDefinition {
    scheme: String,
    parameters: AuthorizationParameters,
}

// Parameter keys are lowercase on the wire, unlike the rest of the API.
#[derive(Debug, Serialize)]
struct AuthorizationParameters {
    #[serde(rename = "tenantid")]
    tenant_id: String,
    #[serde(rename = "serviceprincipalid")]
    service_principal_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointData {
    subscription_id: String,
    subscription_name: String,
    environment: String,
    scope_level: String,
    creation_mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectEndpointReference {
    project_reference: ProjectReferenceBody,
    name: String,
}

#[derive(Debug, Serialize)]
struct ProjectReferenceBody {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct EndpointList {
    value: Vec<ServiceEndpoint>,
}

/// REST client for the Azure DevOps service-endpoint API.
///
/// Every call attaches a bearer token for the fixed DevOps resource; token
/// acquisition is delegated to the shared [`TokenCache`] session. No
/// automatic retries.
#[derive(Debug)]
pub struct DevOpsClient {
    http_client: reqwest::Client,
    tokens: Arc<TokenCache>,
    environment: AzureEnvironment,
    base_url: String,
}

impl DevOpsClient {
    /// Creates a new client against the public `dev.azure.com` base.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(tokens: Arc<TokenCache>, environment: AzureEnvironment) -> DevOpsResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DevOpsError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            tokens,
            environment,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the API base URL (tests, Azure DevOps Server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        self.base_url = base;
        self
    }

    /// Resolves a project name to its project reference.
    ///
    /// # Errors
    ///
    /// Returns [`DevOpsError::ProjectNotFound`] if the project does not
    /// exist; provisioning cannot proceed without it.
    #[instrument(skip(self))]
    pub async fn resolve_project(&self, org: &str, project: &str) -> DevOpsResult<ProjectReference> {
        let url = format!("{}/{}/_apis/projects/{}", self.base_url, org, project);

        let result: DevOpsResult<ProjectReference> = self
            .get(&url, &[("api-version", PROJECTS_API_VERSION)])
            .await;

        match result {
            Ok(reference) => {
                info!("Resolved project '{}' to {}", project, reference.id);
                Ok(reference)
            }
            Err(DevOpsError::Api { status: 404, .. }) => {
                Err(DevOpsError::ProjectNotFound(format!("{org}/{project}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Looks up an endpoint by name in the project.
    ///
    /// Endpoint creation itself performs no duplicate check, so callers use
    /// this before [`DevOpsClient::create_endpoint`] to keep re-runs from
    /// piling up connections.
    #[instrument(skip(self))]
    pub async fn find_endpoint_by_name(
        &self,
        org: &str,
        project: &str,
        name: &str,
    ) -> DevOpsResult<Option<ServiceEndpoint>> {
        let url = format!(
            "{}/{}/{}/_apis/serviceendpoint/endpoints",
            self.base_url, org, project
        );

        let list: EndpointList = self
            .get(
                &url,
                &[
                    ("endpointNames", name),
                    ("api-version", ENDPOINTS_API_VERSION),
                ],
            )
            .await?;

        Ok(list.value.into_iter().find(|e| e.name == name))
    }

    /// Creates a service endpoint bound to the workload identity via OIDC
    /// federation.
    ///
    /// Performs no pre-existence check of its own; the caller's lookup is
    /// the sole idempotency guard at this layer.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_endpoint(
        &self,
        org: &str,
        request: &EndpointRequest,
    ) -> DevOpsResult<ServiceEndpoint> {
        let url = format!("{}/{}/_apis/serviceendpoint/endpoints", self.base_url, org);

        let definition = EndpointDefinition {
            name: request.name.clone(),
            endpoint_type: "azurerm".to_string(),
            url: "https://management.azure.com/".to_string(),
            authorization: AuthorizationDefinition {
                scheme: WORKLOAD_IDENTITY_FEDERATION_SCHEME.to_string(),
                parameters: AuthorizationParameters {
                    tenant_id: request.tenant_id.clone(),
                    service_principal_id: request.service_principal_id.clone(),
                },
            },
            data: EndpointData {
                subscription_id: request.subscription_id.clone(),
                subscription_name: request.subscription_name.clone(),
                environment: "AzureCloud".to_string(),
                scope_level: "Subscription".to_string(),
                creation_mode: "Manual".to_string(),
            },
            is_shared: false,
            is_ready: true,
            service_endpoint_project_references: vec![ProjectEndpointReference {
                project_reference: ProjectReferenceBody {
                    id: request.project.id.clone(),
                    name: request.project.name.clone(),
                },
                name: request.name.clone(),
            }],
        };

        let endpoint: ServiceEndpoint = self
            .post(
                &url,
                &[("api-version", ENDPOINTS_API_VERSION)],
                &definition,
            )
            .await?;

        info!(
            "Created service connection '{}' with id {}",
            endpoint.name, endpoint.id
        );

        Ok(endpoint)
    }

    /// Retrieves an endpoint by id, including the platform-assigned issuer.
    ///
    /// The issuer cannot be predicted client-side; it must always be read
    /// back after creation.
    #[instrument(skip(self))]
    pub async fn get_endpoint(
        &self,
        org: &str,
        project: &str,
        id: &str,
    ) -> DevOpsResult<ServiceEndpoint> {
        let url = format!(
            "{}/{}/{}/_apis/serviceendpoint/endpoints/{}",
            self.base_url, org, project, id
        );

        self.get(&url, &[("api-version", ENDPOINTS_API_VERSION)])
            .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> DevOpsResult<T> {
        let response = self
            .send(reqwest::Method::GET, url, query, None::<&()>)
            .await?;
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> DevOpsResult<T> {
        let response = self
            .send(reqwest::Method::POST, url, query, Some(body))
            .await?;
        Ok(response.json().await?)
    }

    async fn send<B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> DevOpsResult<reqwest::Response> {
        let token = self
            .tokens
            .token_for(&self.environment.devops_scope())
            .await?;

        let mut request = self
            .http_client
            .request(method, url)
            .bearer_auth(&token)
            .query(query);

        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(DevOpsError::from_response(status, &error_body))
    }
}
