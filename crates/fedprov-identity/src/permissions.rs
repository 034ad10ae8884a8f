//! API permission grants and best-effort admin consent.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::graph::{odata_literal, DirectoryList};
use crate::{IdentityClient, IdentityError, IdentityResult, WorkloadIdentity};

/// Well-known application id of the Microsoft Graph resource.
pub const MICROSOFT_GRAPH_RESOURCE_APP_ID: &str = "00000003-0000-0000-c000-000000000000";

/// App-role id of the `Directory.Read.All` application permission.
pub const DIRECTORY_READ_ALL_ROLE_ID: &str = "7ab1d382-f21e-2acf-a31e-33b9f440a765";

/// An API permission, keyed by (resource, permission, type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiPermission {
    /// Application id of the resource API the permission belongs to.
    pub resource_app_id: String,
    /// Id of the permission (app role or scope) on that resource.
    pub permission_id: String,
    /// Permission type: `Role` (application) or `Scope` (delegated).
    pub access_type: String,
}

impl ApiPermission {
    /// The fixed directory-read permission this workflow grants.
    #[must_use]
    pub fn directory_read_all() -> Self {
        Self {
            resource_app_id: MICROSOFT_GRAPH_RESOURCE_APP_ID.to_string(),
            permission_id: DIRECTORY_READ_ALL_ROLE_ID.to_string(),
            access_type: "Role".to_string(),
        }
    }
}

/// Per-permission result of [`IdentityClient::ensure_permissions`].
#[derive(Debug, Clone)]
pub struct PermissionOutcome {
    pub permission: ApiPermission,
    pub status: PermissionStatus,
}

/// Status of one requested permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Added by this call.
    Granted,
    /// Already present on the application; nothing was done.
    Skipped,
    /// The grant attempt failed; other permissions were still processed.
    Failed(String),
}

/// Outcome of an admin-consent request.
///
/// Consent is an asynchronous directory-side operation with no reliable
/// synchronous confirmation. `Requested` means the grants were submitted,
/// not that consent is effective; operators should verify in the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// Consent grants were submitted (best-effort, unverified).
    Requested,
    /// Submission itself failed.
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RequiredResourceAccess {
    #[serde(rename = "resourceAppId")]
    resource_app_id: String,
    #[serde(rename = "resourceAccess")]
    resource_access: Vec<ResourceAccess>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceAccess {
    id: String,
    #[serde(rename = "type")]
    access_type: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationResourceAccess {
    #[serde(rename = "requiredResourceAccess", default)]
    required_resource_access: Vec<RequiredResourceAccess>,
}

#[derive(Debug, Deserialize)]
struct ServicePrincipalId {
    id: String,
}

impl IdentityClient {
    /// Ensures the requested permissions are declared on the application
    /// registration.
    ///
    /// Permissions are a set keyed by (resource, id, type): present ones are
    /// skipped, missing ones are added one at a time so one failing grant
    /// does not block the others. Returns the per-permission outcomes.
    #[instrument(skip(self, identity, requested), fields(display_name = %identity.display_name))]
    pub async fn ensure_permissions(
        &self,
        identity: &WorkloadIdentity,
        requested: &[ApiPermission],
    ) -> IdentityResult<Vec<PermissionOutcome>> {
        let url = format!(
            "{}/applications/{}",
            self.graph().base_url(),
            identity.application_object_id
        );

        let app: ApplicationResourceAccess = self
            .graph()
            .get_query(&url, &[("$select", "id,requiredResourceAccess")])
            .await?;

        let mut current = app.required_resource_access;
        let mut outcomes = Vec::with_capacity(requested.len());

        for permission in requested {
            if contains_permission(&current, permission) {
                info!(
                    "Permission {} on {} already granted, skipping",
                    permission.permission_id, permission.resource_app_id
                );
                outcomes.push(PermissionOutcome {
                    permission: permission.clone(),
                    status: PermissionStatus::Skipped,
                });
                continue;
            }

            let candidate = with_permission(&current, permission);
            let patch = json!({ "requiredResourceAccess": candidate });

            match self.graph().patch_unit(&url, &patch).await {
                Ok(()) => {
                    info!(
                        "Granted permission {} on {}",
                        permission.permission_id, permission.resource_app_id
                    );
                    current = candidate;
                    outcomes.push(PermissionOutcome {
                        permission: permission.clone(),
                        status: PermissionStatus::Granted,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to grant permission {} on {}: {}",
                        permission.permission_id, permission.resource_app_id, e
                    );
                    outcomes.push(PermissionOutcome {
                        permission: permission.clone(),
                        status: PermissionStatus::Failed(e.to_string()),
                    });
                }
            }
        }

        Ok(outcomes)
    }

    /// Requests tenant-wide admin consent for the given permissions by
    /// creating app-role assignments on the resource service principals.
    ///
    /// Waits a fixed settle delay first: freshly declared permissions are
    /// not immediately visible to the consent path. The outcome is
    /// best-effort; the platform does not confirm consent synchronously.
    #[instrument(skip(self, identity, permissions), fields(display_name = %identity.display_name))]
    pub async fn grant_admin_consent(
        &self,
        identity: &WorkloadIdentity,
        permissions: &[ApiPermission],
    ) -> ConsentOutcome {
        let settle = self.consent_settle();
        if !settle.is_zero() {
            info!(
                "Waiting {:?} for permission propagation before admin consent",
                settle
            );
            tokio::time::sleep(settle).await;
        }

        let mut failures = Vec::new();

        for permission in permissions {
            if let Err(e) = self.consent_app_role(identity, permission).await {
                failures.push(format!(
                    "{} on {}: {}",
                    permission.permission_id, permission.resource_app_id, e
                ));
            }
        }

        if failures.is_empty() {
            info!(
                "Admin consent requested for '{}' (effectiveness is not confirmed synchronously)",
                identity.display_name
            );
            ConsentOutcome::Requested
        } else {
            ConsentOutcome::Failed(failures.join("; "))
        }
    }

    async fn consent_app_role(
        &self,
        identity: &WorkloadIdentity,
        permission: &ApiPermission,
    ) -> IdentityResult<()> {
        let resource_sp_id = self
            .find_service_principal_by_app_id(&permission.resource_app_id)
            .await?;

        let url = format!(
            "{}/servicePrincipals/{}/appRoleAssignedTo",
            self.graph().base_url(),
            resource_sp_id
        );

        let result: IdentityResult<serde_json::Value> = self
            .graph()
            .post(
                &url,
                &json!({
                    "principalId": identity.service_principal_object_id,
                    "resourceId": resource_sp_id,
                    "appRoleId": permission.permission_id,
                }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // The platform rejects duplicate app-role assignments; an
            // existing one means consent was already granted.
            Err(IdentityError::Api { ref message, .. })
                if message.contains("already exists") =>
            {
                debug!(
                    "App role {} already assigned to '{}'",
                    permission.permission_id, identity.display_name
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn find_service_principal_by_app_id(&self, app_id: &str) -> IdentityResult<String> {
        let filter = format!("appId eq '{}'", odata_literal(app_id));
        let url = format!("{}/servicePrincipals", self.graph().base_url());

        let list: DirectoryList<ServicePrincipalId> = self
            .graph()
            .get_query(&url, &[("$filter", &filter), ("$select", "id")])
            .await?;

        list.value
            .into_iter()
            .next()
            .map(|sp| sp.id)
            .ok_or_else(|| {
                IdentityError::NotFound(format!("service principal with appId {app_id}"))
            })
    }
}

fn contains_permission(current: &[RequiredResourceAccess], permission: &ApiPermission) -> bool {
    current.iter().any(|resource| {
        resource.resource_app_id == permission.resource_app_id
            && resource.resource_access.iter().any(|access| {
                access.id == permission.permission_id
                    && access.access_type == permission.access_type
            })
    })
}

fn with_permission(
    current: &[RequiredResourceAccess],
    permission: &ApiPermission,
) -> Vec<RequiredResourceAccess> {
    let mut merged = current.to_vec();
    let access = ResourceAccess {
        id: permission.permission_id.clone(),
        access_type: permission.access_type.clone(),
    };

    if let Some(resource) = merged
        .iter_mut()
        .find(|r| r.resource_app_id == permission.resource_app_id)
    {
        resource.resource_access.push(access);
    } else {
        merged.push(RequiredResourceAccess {
            resource_app_id: permission.resource_app_id.clone(),
            resource_access: vec![access],
        });
    }

    merged
}
