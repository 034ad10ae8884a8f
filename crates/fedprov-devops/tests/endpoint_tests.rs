//! Integration tests for the Azure DevOps service-connection client.

use std::sync::Arc;

use fedprov_auth::{AzureEnvironment, ClientCredentials, TokenCache};
use fedprov_devops::{DevOpsClient, DevOpsError, EndpointRequest, ProjectReference};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT_ID: &str = "test-tenant";

async fn start_mock() -> (MockServer, DevOpsClient) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "mock-access-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let environment = AzureEnvironment::custom(server.uri(), server.uri(), server.uri());
    let credentials = ClientCredentials {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string().into(),
    };
    let tokens = Arc::new(TokenCache::new(
        credentials,
        environment.clone(),
        TENANT_ID.to_string(),
    ));

    let client = DevOpsClient::new(tokens, environment)
        .unwrap()
        .with_base_url(server.uri());

    (server, client)
}

fn endpoint_body(id: &str, name: &str, issuer: Option<&str>) -> serde_json::Value {
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

fn endpoint_request(project: ProjectReference) -> EndpointRequest {
    EndpointRequest {
        name: "conn-app-Prod-devops".to_string(),
        subscription_id: "sub-2".to_string(),
        subscription_name: "Prod".to_string(),
        tenant_id: TENANT_ID.to_string(),
        service_principal_id: "app-client-1".to_string(),
        project,
    }
}

/// Project resolution returns id and name.
#[tokio::test]
async fn test_resolve_project() {
    let (server, client) = start_mock().await;

    Mock::given(method("GET"))
        .and(path("/contoso/_apis/projects/infra"))
        .and(query_param("api-version", "7.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "project-guid", "name": "infra" })),
        )
        .mount(&server)
        .await;

    let project = client.resolve_project("contoso", "infra").await.unwrap();

    assert_eq!(project.id, "project-guid");
    assert_eq!(project.name, "infra");
}

/// A missing project is fatal with no recovery path.
#[tokio::test]
async fn test_resolve_missing_project_fails() {
    let (server, client) = start_mock().await;

    Mock::given(method("GET"))
        .and(path("/contoso/_apis/projects/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "The following project does not exist: ghost"
        })))
        .mount(&server)
        .await;

    let err = client.resolve_project("contoso", "ghost").await.unwrap_err();
    assert!(matches!(err, DevOpsError::ProjectNotFound(_)));
}

/// Endpoint creation posts the federated-identity definition.
#[tokio::test]
async fn test_create_endpoint_posts_federated_definition() {
    let (server, client) = start_mock().await;

    Mock::given(method("POST"))
        .and(path("/contoso/_apis/serviceendpoint/endpoints"))
        .and(body_partial_json(json!({
            "name": "conn-app-Prod-devops",
            "type": "azurerm",
            "url": "https://management.azure.com/",
            "authorization": {
                "scheme": "WorkloadIdentityFederation",
                "parameters": {
                    "tenantid": TENANT_ID,
                    "serviceprincipalid": "app-client-1"
                }
            },
            "data": {
                "subscriptionId": "sub-2",
                "subscriptionName": "Prod",
                "scopeLevel": "Subscription"
            },
            "serviceEndpointProjectReferences": [{
                "projectReference": { "id": "project-guid", "name": "infra" },
                "name": "conn-app-Prod-devops"
            }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(endpoint_body("ep-1", "conn-app-Prod-devops", None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let project = ProjectReference {
        id: "project-guid".to_string(),
        name: "infra".to_string(),
    };

    let endpoint = client
        .create_endpoint("contoso", &endpoint_request(project))
        .await
        .unwrap();

    assert_eq!(endpoint.id, "ep-1");
    assert_eq!(endpoint.name, "conn-app-Prod-devops");
}

/// Read-back returns the platform-assigned issuer.
#[tokio::test]
async fn test_get_endpoint_returns_issuer() {
    let (server, client) = start_mock().await;

    Mock::given(method("GET"))
        .and(path("/contoso/infra/_apis/serviceendpoint/endpoints/ep-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(endpoint_body(
            "ep-1",
            "conn-app-Prod-devops",
            Some("https://vstoken.dev.azure.com/org-guid"),
        )))
        .mount(&server)
        .await;

    let endpoint = client
        .get_endpoint("contoso", "infra", "ep-1")
        .await
        .unwrap();

    assert_eq!(
        endpoint.issuer(),
        Some("https://vstoken.dev.azure.com/org-guid")
    );
}

/// An endpoint that comes back without federation parameters has no issuer.
#[tokio::test]
async fn test_get_endpoint_without_issuer() {
    let (server, client) = start_mock().await;

    Mock::given(method("GET"))
        .and(path("/contoso/infra/_apis/serviceendpoint/endpoints/ep-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(endpoint_body("ep-1", "conn-app-Prod-devops", None)),
        )
        .mount(&server)
        .await;

    let endpoint = client
        .get_endpoint("contoso", "infra", "ep-1")
        .await
        .unwrap();

    assert_eq!(endpoint.issuer(), None);
}

/// Name lookup returns the matching endpoint when one exists.
#[tokio::test]
async fn test_find_endpoint_by_name_hit() {
    let (server, client) = start_mock().await;

    Mock::given(method("GET"))
        .and(path("/contoso/infra/_apis/serviceendpoint/endpoints"))
        .and(query_param("endpointNames", "conn-app-Prod-devops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "value": [endpoint_body("ep-1", "conn-app-Prod-devops", Some("https://vstoken.dev.azure.com/org-guid"))]
        })))
        .mount(&server)
        .await;

    let found = client
        .find_endpoint_by_name("contoso", "infra", "conn-app-Prod-devops")
        .await
        .unwrap();

    assert_eq!(found.unwrap().id, "ep-1");
}

/// Name lookup returns None when no endpoint matches.
#[tokio::test]
async fn test_find_endpoint_by_name_miss() {
    let (server, client) = start_mock().await;

    Mock::given(method("GET"))
        .and(path("/contoso/infra/_apis/serviceendpoint/endpoints"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "count": 0, "value": [] })),
        )
        .mount(&server)
        .await;

    let found = client
        .find_endpoint_by_name("contoso", "infra", "conn-app-Prod-devops")
        .await
        .unwrap();

    assert!(found.is_none());
}
