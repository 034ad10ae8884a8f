//! Microsoft Graph API HTTP client.
//!
//! Thin request plumbing with bearer-token injection and OData error
//! mapping. The provisioning workflow performs no automatic retries;
//! transient failures surface to the caller and fail the current entry.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use fedprov_auth::{AzureEnvironment, TokenCache};

use crate::{IdentityError, IdentityResult};

/// Response wrapper for Graph collection responses.
#[derive(Debug, Deserialize)]
pub(crate) struct DirectoryList<T> {
    pub value: Vec<T>,
}

/// Escapes a value for embedding in an OData `$filter` string literal.
/// Single quotes are doubled per the OData quoting rules.
pub(crate) fn odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Microsoft Graph API client.
#[derive(Debug)]
pub(crate) struct GraphClient {
    http_client: reqwest::Client,
    tokens: Arc<TokenCache>,
    environment: AzureEnvironment,
}

impl GraphClient {
    pub fn new(tokens: Arc<TokenCache>, environment: AzureEnvironment) -> IdentityResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IdentityError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            tokens,
            environment,
        })
    }

    /// Returns the base URL for Graph API requests.
    pub fn base_url(&self) -> String {
        format!("{}/v1.0", self.environment.graph_endpoint())
    }

    /// Performs a GET request.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> IdentityResult<T> {
        let response = self.send(reqwest::Method::GET, url, &[], None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Performs a GET request with query parameters.
    #[instrument(skip(self, query))]
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> IdentityResult<T> {
        let response = self.send(reqwest::Method::GET, url, query, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Performs a POST request and parses the response body.
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> IdentityResult<T> {
        let response = self.send(reqwest::Method::POST, url, &[], Some(body)).await?;
        Ok(response.json().await?)
    }

    /// Performs a POST request whose success response carries no body
    /// (e.g. `removePassword` returns 204 No Content).
    #[instrument(skip(self, body))]
    pub async fn post_unit<B: serde::Serialize>(&self, url: &str, body: &B) -> IdentityResult<()> {
        self.send(reqwest::Method::POST, url, &[], Some(body)).await?;
        Ok(())
    }

    /// Performs a PATCH request, discarding the (usually empty) response body.
    #[instrument(skip(self, body))]
    pub async fn patch_unit<B: serde::Serialize>(&self, url: &str, body: &B) -> IdentityResult<()> {
        self.send(reqwest::Method::PATCH, url, &[], Some(body)).await?;
        Ok(())
    }

    async fn send<B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> IdentityResult<reqwest::Response> {
        let token = self.tokens.token_for(&self.environment.graph_scope()).await?;

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
        Err(IdentityError::from_response(status, &error_body))
    }
}
