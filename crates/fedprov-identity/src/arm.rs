//! Azure Resource Manager HTTP client.
//!
//! Same plumbing shape as the Graph client but scoped to the ARM resource
//! and carrying an `api-version` query parameter on every call.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use fedprov_auth::{AzureEnvironment, TokenCache};

use crate::{IdentityError, IdentityResult};

/// Response wrapper for ARM collection responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ArmList<T> {
    pub value: Vec<T>,
}

/// Azure Resource Manager client.
#[derive(Debug)]
pub(crate) struct ArmClient {
    http_client: reqwest::Client,
    tokens: Arc<TokenCache>,
    environment: AzureEnvironment,
}

impl ArmClient {
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

    /// Returns the base URL for ARM requests.
    pub fn base_url(&self) -> &str {
        self.environment.arm_endpoint()
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

    /// Performs a PUT request, discarding the response body.
    #[instrument(skip(self, query, body))]
    pub async fn put_unit<B: serde::Serialize>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> IdentityResult<()> {
        self.send(reqwest::Method::PUT, url, query, Some(body)).await?;
        Ok(())
    }

    async fn send<B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> IdentityResult<reqwest::Response> {
        let token = self.tokens.token_for(&self.environment.arm_scope()).await?;

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
