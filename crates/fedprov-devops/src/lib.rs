//! Azure DevOps service-connection client.
//!
//! Implements the CI/CD half of the provisioning workflow: project
//! resolution, service-endpoint creation with workload-identity federation,
//! endpoint lookup by name, and read-back of the platform-assigned OIDC
//! issuer.
//!
//! The per-connection state machine driven by the orchestrator is
//! `Requested -> ProjectResolved -> Created -> IssuerRetrieved ->
//! FederationBound`; the final transition happens on the identity-platform
//! side.

mod client;
mod error;
mod models;

pub use client::{DevOpsClient, EndpointRequest, WORKLOAD_IDENTITY_FEDERATION_SCHEME};
pub use error::{DevOpsError, DevOpsResult};
pub use models::{EndpointAuthorization, ProjectReference, ServiceEndpoint};
