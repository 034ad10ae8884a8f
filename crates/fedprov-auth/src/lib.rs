//! OAuth2 client-credentials authentication for Azure resources.
//!
//! Provides per-scope access-token acquisition and caching against the
//! Microsoft identity platform. Callers (the Graph, ARM and Azure DevOps
//! clients) request tokens by scope; the cache refreshes a token only when
//! it is missing or within the expiry grace period.
//!
//! # Example
//!
//! ```no_run
//! use fedprov_auth::{AzureEnvironment, ClientCredentials, TokenCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = AzureEnvironment::public_cloud();
//! let credentials = ClientCredentials {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string().into(),
//! };
//!
//! let cache = TokenCache::new(credentials, env.clone(), "your-tenant-id".to_string());
//! let token = cache.token_for(&env.arm_scope()).await?;
//! # Ok(())
//! # }
//! ```

mod environment;
mod error;
mod token;

pub use environment::{AzureEnvironment, DEVOPS_RESOURCE_ID};
pub use error::{AuthError, AuthResult};
pub use token::{ClientCredentials, TokenCache};
