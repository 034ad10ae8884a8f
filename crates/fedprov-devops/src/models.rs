//! Wire models for the service-endpoint API.

use std::collections::HashMap;

use serde::Deserialize;

/// A resolved DevOps project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectReference {
    /// Project id (GUID).
    pub id: String,
    /// Project name.
    pub name: String,
}

/// A service endpoint (service connection).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEndpoint {
    /// Endpoint id (GUID), assigned at creation.
    pub id: String,
    /// Endpoint name.
    pub name: String,
    /// Authorization record; carries the issuer for federated endpoints.
    pub authorization: EndpointAuthorization,
    /// Whether the endpoint is ready for use.
    #[serde(rename = "isReady", default)]
    pub is_ready: bool,
}

/// Authorization section of a service endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointAuthorization {
    /// Authorization scheme (`WorkloadIdentityFederation` here).
    pub scheme: String,
    /// Scheme-specific parameters.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl ServiceEndpoint {
    /// The OIDC issuer URL the platform generated for this endpoint.
    ///
    /// Only present once the platform has populated the federation
    /// parameters; opaque to this system and never constructed client-side.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.authorization
            .parameters
            .get("workloadIdentityFederationIssuer")
            .map(String::as_str)
            .filter(|issuer| !issuer.is_empty())
    }
}
