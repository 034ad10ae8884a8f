//! Common test utilities for end-to-end orchestrator tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fedprov_auth::{AzureEnvironment, ClientCredentials, TokenCache};
use fedprov_cli::config::ProvisioningEntry;
use fedprov_cli::orchestrator::Orchestrator;
use fedprov_devops::DevOpsClient;
use fedprov_identity::{
    IdentityClient, DIRECTORY_READ_ALL_ROLE_ID, MICROSOFT_GRAPH_RESOURCE_APP_ID,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "test-tenant";

/// Mock servers for the identity platform (login + Graph + ARM share one
/// server, their paths do not collide) and the CI/CD platform.
pub struct MockPlatforms {
    pub azure: MockServer,
    pub devops: MockServer,
}

impl MockPlatforms {
    /// Starts both servers with the token endpoint mounted.
    pub async fn start() -> Self {
        let azure = MockServer::start().await;
        let devops = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mock-access-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&azure)
            .await;

        Self { azure, devops }
    }

    /// Builds an orchestrator pointed at the mock servers, with the consent
    /// settle delay disabled.
    pub fn orchestrator(&self) -> Orchestrator {
        let environment =
            AzureEnvironment::custom(self.azure.uri(), self.azure.uri(), self.azure.uri());
        let credentials = ClientCredentials {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string().into(),
        };
        let tokens = Arc::new(TokenCache::new(
            credentials,
            environment.clone(),
            TENANT_ID.to_string(),
        ));

        let identity = IdentityClient::new(Arc::clone(&tokens), environment.clone())
            .unwrap()
            .with_consent_settle(Duration::ZERO);
        let devops = DevOpsClient::new(tokens, environment)
            .unwrap()
            .with_base_url(self.devops.uri());

        Orchestrator::new(identity, devops)
    }

    /// Mounts the subscription list.
    pub async fn mock_subscriptions(&self, subscriptions: &[(&str, &str)]) {
        let value: Vec<Value> = subscriptions
            .iter()
            .map(|(id, name)| {
                json!({ "subscriptionId": id, "displayName": name, "tenantId": TENANT_ID })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
            .mount(&self.azure)
            .await;
    }

    /// Mounts the create path for a fresh identity (empty lookup, then
    /// application + service-principal creation).
    pub async fn mock_identity_creation(
        &self,
        display_name: &str,
        app_object_id: &str,
        app_client_id: &str,
        sp_object_id: &str,
    ) {
        Mock::given(method("GET"))
            .and(path("/v1.0/servicePrincipals"))
            .and(query_param(
                "$filter",
                format!("displayName eq '{display_name}'"),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
            .mount(&self.azure)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1.0/applications"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": app_object_id,
                "appId": app_client_id
            })))
            .expect(1)
            .mount(&self.azure)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1.0/servicePrincipals"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": sp_object_id,
                "appId": app_client_id
            })))
            .expect(1)
            .mount(&self.azure)
            .await;
    }

    /// Mounts the reuse path for an existing identity.
    pub async fn mock_existing_identity(
        &self,
        display_name: &str,
        app_object_id: &str,
        app_client_id: &str,
        sp_object_id: &str,
    ) {
        Mock::given(method("GET"))
            .and(path("/v1.0/servicePrincipals"))
            .and(query_param(
                "$filter",
                format!("displayName eq '{display_name}'"),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ "id": sp_object_id, "appId": app_client_id }]
            })))
            .mount(&self.azure)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1.0/applications"))
            .and(query_param("$filter", format!("appId eq '{app_client_id}'")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ "id": app_object_id, "appId": app_client_id }]
            })))
            .mount(&self.azure)
            .await;
    }

    /// Mounts the password-credential read as empty.
    pub async fn mock_no_passwords(&self, app_object_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1.0/applications/{app_object_id}")))
            .and(query_param("$select", "id,passwordCredentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": app_object_id,
                "passwordCredentials": []
            })))
            .mount(&self.azure)
            .await;
    }

    /// Mounts role-assignment lookup and (expected) creation.
    pub async fn mock_role_assignment_creation(&self, subscription_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{subscription_id}/providers/Microsoft.Authorization/roleAssignments"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
            .mount(&self.azure)
            .await;

        Mock::given(method("PUT"))
            .and(path_regex(format!(
                r"^/subscriptions/{subscription_id}/providers/Microsoft\.Authorization/roleAssignments/.+$"
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "assignment-1" })))
            .expect(1)
            .mount(&self.azure)
            .await;
    }

    /// Mounts an already-present Owner assignment for the principal.
    pub async fn mock_existing_owner_assignment(&self, subscription_id: &str, principal_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{subscription_id}/providers/Microsoft.Authorization/roleAssignments"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{
                    "properties": {
                        "roleDefinitionId": format!(
                            "/subscriptions/{subscription_id}/providers/Microsoft.Authorization/roleDefinitions/{}",
                            fedprov_identity::OWNER_ROLE_DEFINITION_ID
                        ),
                        "principalId": principal_id
                    }
                }]
            })))
            .mount(&self.azure)
            .await;
    }

    /// Mounts the permission read as empty plus the (expected) PATCH.
    pub async fn mock_permission_grant(&self, app_object_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1.0/applications/{app_object_id}")))
            .and(query_param("$select", "id,requiredResourceAccess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": app_object_id,
                "requiredResourceAccess": []
            })))
            .mount(&self.azure)
            .await;

        Mock::given(method("PATCH"))
            .and(path(format!("/v1.0/applications/{app_object_id}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&self.azure)
            .await;
    }

    /// Mounts the permission read with the directory-read role present.
    pub async fn mock_permission_already_granted(&self, app_object_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1.0/applications/{app_object_id}")))
            .and(query_param("$select", "id,requiredResourceAccess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": app_object_id,
                "requiredResourceAccess": [{
                    "resourceAppId": MICROSOFT_GRAPH_RESOURCE_APP_ID,
                    "resourceAccess": [
                        { "id": DIRECTORY_READ_ALL_ROLE_ID, "type": "Role" }
                    ]
                }]
            })))
            .mount(&self.azure)
            .await;
    }

    /// Mounts the admin-consent path (resource service principal lookup plus
    /// app-role assignment).
    pub async fn mock_admin_consent(&self, consent_status: u16, consent_body: Value) {
        Mock::given(method("GET"))
            .and(path("/v1.0/servicePrincipals"))
            .and(query_param(
                "$filter",
                format!("appId eq '{MICROSOFT_GRAPH_RESOURCE_APP_ID}'"),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ "id": "graph-sp-id" }]
            })))
            .mount(&self.azure)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1.0/servicePrincipals/graph-sp-id/appRoleAssignedTo"))
            .respond_with(ResponseTemplate::new(consent_status).set_body_json(consent_body))
            .mount(&self.azure)
            .await;
    }

    /// Mounts the DevOps project lookup.
    pub async fn mock_project(&self, org: &str, project: &str, project_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{org}/_apis/projects/{project}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": project_id, "name": project })),
            )
            .mount(&self.devops)
            .await;
    }

    /// Mounts the endpoint-by-name lookup.
    pub async fn mock_endpoint_lookup(&self, org: &str, project: &str, value: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/{org}/{project}/_apis/serviceendpoint/endpoints"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": value.len(),
                "value": value
            })))
            .mount(&self.devops)
            .await;
    }

    /// Mounts endpoint creation.
    pub async fn mock_endpoint_creation(&self, org: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/{org}/_apis/serviceendpoint/endpoints")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.devops)
            .await;
    }

    /// Mounts endpoint retrieval by id.
    pub async fn mock_endpoint_read(&self, org: &str, project: &str, id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/{org}/{project}/_apis/serviceendpoint/endpoints/{id}"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.devops)
            .await;
    }

    /// Mounts the federated-credential list on the application.
    pub async fn mock_federated_credential_list(&self, app_object_id: &str, names: &[&str]) {
        let value: Vec<Value> = names
            .iter()
            .map(|name| json!({ "id": "fic-1", "name": name }))
            .collect();

        Mock::given(method("GET"))
            .and(path(format!(
                "/v1.0/applications/{app_object_id}/federatedIdentityCredentials"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
            .mount(&self.azure)
            .await;
    }

    /// Mounts federated-credential binding.
    pub async fn mock_federated_credential(&self, app_object_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/v1.0/applications/{app_object_id}/federatedIdentityCredentials"
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "fic-1" })))
            .expect(1)
            .mount(&self.azure)
            .await;
    }
}

/// Endpoint body as returned by the DevOps API.
pub fn endpoint_body(id: &str, name: &str, issuer: Option<&str>) -> Value {
    let mut parameters = json!({
        "tenantid": TENANT_ID,
        "serviceprincipalid": "app-client-1"
    });
    if let Some(issuer) = issuer {
        parameters["workloadIdentityFederationIssuer"] = json!(issuer);
    }
    json!({
        "id": id,
        "name": name,
        "isReady": true,
        "authorization": {
            "scheme": "WorkloadIdentityFederation",
            "parameters": parameters
        }
    })
}

/// Entry without a service connection.
pub fn plain_entry(subscription_name: &str) -> ProvisioningEntry {
    ProvisioningEntry {
        subscription_name: subscription_name.to_string(),
        create_service_connection: false,
        org_name: None,
        project_name: None,
    }
}

/// Entry with a service connection.
pub fn connection_entry(subscription_name: &str, org: &str, project: &str) -> ProvisioningEntry {
    ProvisioningEntry {
        subscription_name: subscription_name.to_string(),
        create_service_connection: true,
        org_name: Some(org.to_string()),
        project_name: Some(project.to_string()),
    }
}
