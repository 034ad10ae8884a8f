//! Common test utilities for fedprov-identity integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fedprov_auth::{AzureEnvironment, ClientCredentials, TokenCache};
use fedprov_identity::IdentityClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "test-tenant";

/// Mock server standing in for the login, Graph and ARM endpoints at once
/// (their paths do not collide).
pub struct MockAzure {
    pub server: MockServer,
}

impl MockAzure {
    /// Starts the mock server with the token endpoint already mounted.
    pub async fn start() -> Self {
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

        Self { server }
    }

    /// Returns the mock server's base URL.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn environment(&self) -> AzureEnvironment {
        AzureEnvironment::custom(self.url(), self.url(), self.url())
    }

    /// Builds an identity client pointed at the mock server, with the
    /// consent settle delay disabled.
    pub fn client(&self) -> IdentityClient {
        let credentials = ClientCredentials {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string().into(),
        };
        let tokens = Arc::new(TokenCache::new(
            credentials,
            self.environment(),
            TENANT_ID.to_string(),
        ));

        IdentityClient::new(tokens, self.environment())
            .unwrap()
            .with_consent_settle(Duration::ZERO)
    }
}

/// Test data factory for a service principal record.
pub fn service_principal(id: &str, app_id: &str, display_name: &str) -> Value {
    json!({
        "id": id,
        "appId": app_id,
        "displayName": display_name
    })
}

/// Test data factory for an application registration record.
pub fn application(id: &str, app_id: &str) -> Value {
    json!({
        "id": id,
        "appId": app_id
    })
}

/// Wraps items in a Graph/ARM collection response.
pub fn list_response(items: Vec<Value>) -> Value {
    json!({ "value": items })
}
