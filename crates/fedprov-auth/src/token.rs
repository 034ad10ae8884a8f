//! Per-scope access-token cache using the client-credentials flow.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{AuthError, AuthResult, AzureEnvironment};

/// Client id + secret of the principal running the provisioning session.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// OAuth2 token response from the identity platform.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[allow(dead_code)]
    token_type: String,
}

/// Cached OAuth2 access token for one scope.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Token cache keyed by OAuth2 scope.
///
/// The provisioning workflow talks to three resources (ARM, Graph, Azure
/// DevOps) with the same client credentials; each resource needs its own
/// token, so the cache holds one entry per scope.
#[derive(Debug)]
pub struct TokenCache {
    credentials: ClientCredentials,
    environment: AzureEnvironment,
    tenant_id: String,
    http_client: reqwest::Client,
    cached_tokens: Arc<RwLock<HashMap<String, CachedToken>>>,
    /// Grace period before expiry to trigger refresh (default: 5 minutes).
    grace_period: Duration,
}

impl TokenCache {
    /// Creates a new token cache.
    pub fn new(
        credentials: ClientCredentials,
        environment: AzureEnvironment,
        tenant_id: String,
    ) -> Self {
        Self {
            credentials,
            environment,
            tenant_id,
            http_client: reqwest::Client::new(),
            cached_tokens: Arc::new(RwLock::new(HashMap::new())),
            grace_period: Duration::minutes(5),
        }
    }

    /// Tenant this cache acquires tokens for.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Gets a valid access token for the given scope, refreshing if necessary.
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn token_for(&self, scope: &str) -> AuthResult<String> {
        {
            let cache = self.cached_tokens.read().await;
            if let Some(token) = cache.get(scope) {
                if !token.is_expired(self.grace_period) {
                    debug!("Using cached token for scope {}", scope);
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("Acquiring access token for scope {}", scope);
        let new_token = self.acquire_token(scope).await?;
        let access_token = new_token.access_token.clone();

        {
            let mut cache = self.cached_tokens.write().await;
            cache.insert(scope.to_string(), new_token);
        }

        Ok(access_token)
    }

    /// Acquires a new access token using the client-credentials flow.
    #[instrument(skip(self))]
    async fn acquire_token(&self, scope: &str) -> AuthResult<CachedToken> {
        use secrecy::ExposeSecret;

        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.environment.login_endpoint(),
            self.tenant_id
        );

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.credentials.client_id),
            ("client_secret", self.credentials.client_secret.expose_secret()),
            ("scope", scope),
        ];

        let response = self.http_client.post(&token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRequest { status, body });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenParse(e.to_string()))?;

        let expires_at = Utc::now() + Duration::seconds(token_response.expires_in);

        debug!(
            "Acquired token for scope {}, expires at {}",
            scope,
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }

    /// Invalidates all cached tokens, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        let mut cache = self.cached_tokens.write().await;
        cache.clear();
    }
}
