//! Subscription resolution.

use serde::Deserialize;
use tracing::{info, instrument};

use crate::arm::ArmList;
use crate::{IdentityClient, IdentityError, IdentityResult};

const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";

/// Explicit subscription context threaded through every scoped operation.
///
/// Replaces the ambient "active subscription" selection: each provisioning
/// entry resolves its own context and passes it along, so state never leaks
/// from one entry to the next.
#[derive(Debug, Clone)]
pub struct SubscriptionContext {
    /// Subscription id (GUID).
    pub subscription_id: String,
    /// Subscription display name as declared in the entry.
    pub subscription_name: String,
    /// Tenant owning the subscription.
    pub tenant_id: String,
}

impl SubscriptionContext {
    /// ARM scope path for this subscription.
    #[must_use]
    pub fn scope(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionRecord {
    #[serde(rename = "subscriptionId")]
    subscription_id: String,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(rename = "tenantId")]
    tenant_id: String,
}

impl IdentityClient {
    /// Resolves a subscription display name to an explicit context.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] if no visible subscription carries
    /// the given display name. The caller treats this as fatal for the entry.
    #[instrument(skip(self))]
    pub async fn resolve_subscription(&self, name: &str) -> IdentityResult<SubscriptionContext> {
        let url = format!("{}/subscriptions", self.arm().base_url());

        let list: ArmList<SubscriptionRecord> = self
            .arm()
            .get_query(&url, &[("api-version", SUBSCRIPTIONS_API_VERSION)])
            .await?;

        let record = list
            .value
            .into_iter()
            .find(|s| s.display_name == name)
            .ok_or_else(|| IdentityError::NotFound(format!("subscription '{name}'")))?;

        info!(
            "Resolved subscription '{}' to {}",
            name, record.subscription_id
        );

        Ok(SubscriptionContext {
            subscription_id: record.subscription_id,
            subscription_name: record.display_name,
            tenant_id: record.tenant_id,
        })
    }
}
