//! Entra ID provisioning operations for federated workload identities.
//!
//! This crate implements the identity-platform half of the provisioning
//! workflow against Microsoft Graph and Azure Resource Manager:
//!
//! - resolve-or-create of an application + service-principal pair by
//!   display name, and removal of password credentials
//! - idempotent Owner role assignment at subscription scope
//! - idempotent API permission grants with best-effort admin consent
//! - federated-credential binding on the application object
//!
//! All operations take an explicit [`SubscriptionContext`] where subscription
//! scope matters; there is no ambient "active subscription" state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fedprov_auth::{AzureEnvironment, ClientCredentials, TokenCache};
//! use fedprov_identity::IdentityClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = AzureEnvironment::public_cloud();
//! let credentials = ClientCredentials {
//!     client_id: "client-id".to_string(),
//!     client_secret: "client-secret".to_string().into(),
//! };
//! let tokens = Arc::new(TokenCache::new(credentials, env.clone(), "tenant-id".to_string()));
//!
//! let client = IdentityClient::new(tokens, env)?;
//! let identity = client.resolve_or_create_identity("app-Dev-devops").await?;
//! client.strip_password_credentials(&identity).await?;
//! # Ok(())
//! # }
//! ```

mod arm;
mod client;
mod error;
mod federation;
mod graph;
mod identity;
mod permissions;
mod roles;
mod subscriptions;

// Re-exports
pub use client::IdentityClient;
pub use error::{IdentityError, IdentityResult};
pub use federation::{FederatedCredentialSpec, FEDERATION_AUDIENCE};
pub use identity::WorkloadIdentity;
pub use permissions::{
    ApiPermission, ConsentOutcome, PermissionOutcome, PermissionStatus,
    DIRECTORY_READ_ALL_ROLE_ID, MICROSOFT_GRAPH_RESOURCE_APP_ID,
};
pub use roles::{EnsureOutcome, OWNER_ROLE_DEFINITION_ID};
pub use subscriptions::SubscriptionContext;
