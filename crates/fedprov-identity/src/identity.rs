//! Workload-identity (application + service principal) provisioning.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::graph::{odata_literal, DirectoryList};
use crate::{IdentityClient, IdentityError, IdentityResult};

/// A provisioned workload identity: an application registration plus its
/// service principal.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadIdentity {
    /// Display name (`app-<subscriptionName>-devops`).
    pub display_name: String,
    /// Application (client) id.
    pub application_id: String,
    /// Object id of the application registration.
    pub application_object_id: String,
    /// Object id of the service principal; the principal id used for role
    /// assignments.
    pub service_principal_object_id: String,
    /// Tenant the identity lives in.
    pub tenant_id: String,
}

#[derive(Debug, Deserialize)]
struct ServicePrincipalRecord {
    id: String,
    #[serde(rename = "appId")]
    app_id: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationRecord {
    id: String,
    #[serde(rename = "appId")]
    app_id: String,
}

#[derive(Debug, Deserialize)]
struct PasswordCredentialRecord {
    #[serde(rename = "keyId")]
    key_id: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationPasswords {
    #[serde(rename = "passwordCredentials", default)]
    password_credentials: Vec<PasswordCredentialRecord>,
}

impl IdentityClient {
    /// Looks up a workload identity by exact display name, creating the
    /// application + service-principal pair if none exists.
    ///
    /// Lookup-before-create is mandatory: at most one identity per display
    /// name may exist, and a re-run against an already-provisioned name must
    /// reuse it rather than create a duplicate.
    #[instrument(skip(self))]
    pub async fn resolve_or_create_identity(
        &self,
        display_name: &str,
    ) -> IdentityResult<WorkloadIdentity> {
        let filter = format!("displayName eq '{}'", odata_literal(display_name));
        let url = format!("{}/servicePrincipals", self.graph().base_url());

        let existing: DirectoryList<ServicePrincipalRecord> = self
            .graph()
            .get_query(&url, &[("$filter", &filter), ("$select", "id,appId")])
            .await?;

        if let Some(sp) = existing.value.into_iter().next() {
            warn!(
                "Service principal '{}' already exists, reusing it",
                display_name
            );
            let application = self.find_application_by_app_id(&sp.app_id).await?;
            return Ok(WorkloadIdentity {
                display_name: display_name.to_string(),
                application_id: sp.app_id,
                application_object_id: application.id,
                service_principal_object_id: sp.id,
                tenant_id: self.tenant_id().to_string(),
            });
        }

        info!("Creating service principal '{}'", display_name);

        let app_url = format!("{}/applications", self.graph().base_url());
        let application: ApplicationRecord = self
            .graph()
            .post(
                &app_url,
                &json!({
                    "displayName": display_name,
                    "signInAudience": "AzureADMyOrg",
                }),
            )
            .await?;

        let sp: ServicePrincipalRecord = self
            .graph()
            .post(&url, &json!({ "appId": application.app_id }))
            .await?;

        info!(
            "Created identity '{}' with application id {}",
            display_name, application.app_id
        );

        Ok(WorkloadIdentity {
            display_name: display_name.to_string(),
            application_id: application.app_id,
            application_object_id: application.id,
            service_principal_object_id: sp.id,
            tenant_id: self.tenant_id().to_string(),
        })
    }

    /// Removes every password credential from the identity's application
    /// registration, leaving federated (credential-less) auth as the only
    /// path. Side effect only.
    #[instrument(skip(self, identity), fields(display_name = %identity.display_name))]
    pub async fn strip_password_credentials(
        &self,
        identity: &WorkloadIdentity,
    ) -> IdentityResult<()> {
        let url = format!(
            "{}/applications/{}",
            self.graph().base_url(),
            identity.application_object_id
        );

        let app: ApplicationPasswords = self
            .graph()
            .get_query(&url, &[("$select", "id,passwordCredentials")])
            .await?;

        if app.password_credentials.is_empty() {
            info!("No password credentials on '{}'", identity.display_name);
            return Ok(());
        }

        let count = app.password_credentials.len();
        for credential in app.password_credentials {
            let remove_url = format!("{url}/removePassword");
            self.graph()
                .post_unit(&remove_url, &json!({ "keyId": credential.key_id }))
                .await?;
        }

        info!(
            "Removed {} password credential(s) from '{}'",
            count, identity.display_name
        );

        Ok(())
    }

    async fn find_application_by_app_id(&self, app_id: &str) -> IdentityResult<ApplicationRecord> {
        let filter = format!("appId eq '{}'", odata_literal(app_id));
        let url = format!("{}/applications", self.graph().base_url());

        let list: DirectoryList<ApplicationRecord> = self
            .graph()
            .get_query(&url, &[("$filter", &filter), ("$select", "id,appId")])
            .await?;

        list.value
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::NotFound(format!("application with appId {app_id}")))
    }
}
