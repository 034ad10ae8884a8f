//! Federated-credential binding on the application object.

use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::graph::DirectoryList;
use crate::{IdentityClient, IdentityResult, WorkloadIdentity};

/// Fixed audience accepted by the identity platform for workload-identity
/// token exchange.
pub const FEDERATION_AUDIENCE: &str = "api://AzureADTokenExchange";

/// Federated-credential trust record to attach to an application.
///
/// The subject must exactly match the convention the CI/CD platform embeds
/// in its federation tokens (`sc://<org>/<project>/<connectionName>`); a
/// mismatch only surfaces at pipeline run time, never during provisioning.
#[derive(Debug, Clone)]
pub struct FederatedCredentialSpec {
    /// Credential name, unique per application.
    pub name: String,
    /// Issuer URL assigned by the CI/CD platform; always read back from the
    /// created endpoint, never constructed.
    pub issuer: String,
    /// Federation subject identifier.
    pub subject: String,
}

#[derive(Debug, Deserialize)]
struct FederatedCredentialRecord {
    name: String,
}

impl IdentityClient {
    /// Returns whether the application already carries a federated
    /// credential with the given name.
    ///
    /// Used before binding against a reused service connection: the
    /// connection existing does not imply the credential does (a previous
    /// run may have failed between the two steps).
    #[instrument(skip(self, identity), fields(display_name = %identity.display_name))]
    pub async fn has_federated_credential(
        &self,
        identity: &WorkloadIdentity,
        name: &str,
    ) -> IdentityResult<bool> {
        let url = format!(
            "{}/applications/{}/federatedIdentityCredentials",
            self.graph().base_url(),
            identity.application_object_id
        );

        let list: DirectoryList<FederatedCredentialRecord> = self.graph().get(&url).await?;
        Ok(list.value.iter().any(|credential| credential.name == name))
    }

    /// Creates a federated-credential record on the identity's application
    /// object.
    ///
    /// No pre-existence check is performed; binding against an application
    /// that already carries a credential of the same name fails, and the
    /// caller treats that as fatal for the entry.
    #[instrument(skip(self, identity, spec), fields(display_name = %identity.display_name, subject = %spec.subject))]
    pub async fn bind_federated_credential(
        &self,
        identity: &WorkloadIdentity,
        spec: &FederatedCredentialSpec,
    ) -> IdentityResult<()> {
        let url = format!(
            "{}/applications/{}/federatedIdentityCredentials",
            self.graph().base_url(),
            identity.application_object_id
        );

        let _: serde_json::Value = self
            .graph()
            .post(
                &url,
                &json!({
                    "name": spec.name,
                    "issuer": spec.issuer,
                    "subject": spec.subject,
                    "audiences": [FEDERATION_AUDIENCE],
                }),
            )
            .await?;

        info!(
            "Bound federated credential '{}' with subject '{}'",
            spec.name, spec.subject
        );

        Ok(())
    }
}
