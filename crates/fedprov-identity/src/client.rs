//! Facade over the Graph and ARM clients.

use std::sync::Arc;
use std::time::Duration;

use fedprov_auth::{AzureEnvironment, TokenCache};

use crate::arm::ArmClient;
use crate::graph::GraphClient;
use crate::IdentityResult;

/// Default settle delay before requesting admin consent. Newly granted
/// permissions take time to propagate through the directory; consenting too
/// early fails spuriously.
const DEFAULT_CONSENT_SETTLE: Duration = Duration::from_secs(20);

/// Client for identity-platform provisioning operations.
///
/// Wraps a Microsoft Graph client (applications, service principals,
/// permissions, federated credentials) and an ARM client (subscriptions,
/// role assignments) sharing one token cache. Operations are implemented in
/// the sibling modules as `impl IdentityClient` blocks.
#[derive(Debug)]
pub struct IdentityClient {
    graph: GraphClient,
    arm: ArmClient,
    tokens: Arc<TokenCache>,
    consent_settle: Duration,
}

impl IdentityClient {
    /// Creates a new identity client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be created.
    pub fn new(tokens: Arc<TokenCache>, environment: AzureEnvironment) -> IdentityResult<Self> {
        Ok(Self {
            graph: GraphClient::new(Arc::clone(&tokens), environment.clone())?,
            arm: ArmClient::new(Arc::clone(&tokens), environment)?,
            tokens,
            consent_settle: DEFAULT_CONSENT_SETTLE,
        })
    }

    /// Overrides the settle delay before admin consent (tests use zero).
    #[must_use]
    pub fn with_consent_settle(mut self, settle: Duration) -> Self {
        self.consent_settle = settle;
        self
    }

    /// Tenant this client provisions into.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        self.tokens.tenant_id()
    }

    pub(crate) fn graph(&self) -> &GraphClient {
        &self.graph
    }

    pub(crate) fn arm(&self) -> &ArmClient {
        &self.arm
    }

    pub(crate) fn consent_settle(&self) -> Duration {
        self.consent_settle
    }
}
