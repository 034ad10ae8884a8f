//! Role assignment at subscription scope.

use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::arm::ArmList;
use crate::{IdentityClient, IdentityResult, SubscriptionContext};

const ROLE_ASSIGNMENTS_API_VERSION: &str = "2022-04-01";

/// ARM role definition id of the built-in Owner role.
pub const OWNER_ROLE_DEFINITION_ID: &str = "8e3af657-a8ff-443c-a75c-2fe8c4bcb635";

/// Outcome of an ensure-style operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The resource was created by this call.
    Created,
    /// The resource already existed; nothing was done.
    AlreadyPresent,
}

#[derive(Debug, Deserialize)]
struct RoleAssignmentRecord {
    properties: RoleAssignmentProperties,
}

#[derive(Debug, Deserialize)]
struct RoleAssignmentProperties {
    #[serde(rename = "roleDefinitionId")]
    role_definition_id: String,
}

impl IdentityClient {
    /// Ensures the principal holds Owner at the subscription's scope.
    ///
    /// Existing assignments are queried first; assignment creation is not
    /// idempotent at the platform level, so the presence check is mandatory,
    /// not advisory.
    #[instrument(skip(self, context), fields(subscription = %context.subscription_name))]
    pub async fn ensure_role_assignment(
        &self,
        context: &SubscriptionContext,
        principal_id: &str,
    ) -> IdentityResult<EnsureOutcome> {
        let url = format!(
            "{}{}/providers/Microsoft.Authorization/roleAssignments",
            self.arm().base_url(),
            context.scope()
        );

        let filter = format!("principalId eq '{principal_id}'");
        let existing: ArmList<RoleAssignmentRecord> = self
            .arm()
            .get_query(
                &url,
                &[
                    ("api-version", ROLE_ASSIGNMENTS_API_VERSION),
                    ("$filter", &filter),
                ],
            )
            .await?;

        let already_assigned = existing.value.iter().any(|a| {
            a.properties
                .role_definition_id
                .ends_with(OWNER_ROLE_DEFINITION_ID)
        });

        if already_assigned {
            info!(
                "Owner assignment for principal {} already present at {}, skipping",
                principal_id,
                context.scope()
            );
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        let role_definition_id = format!(
            "{}/providers/Microsoft.Authorization/roleDefinitions/{}",
            context.scope(),
            OWNER_ROLE_DEFINITION_ID
        );

        // Assignment names are caller-chosen GUIDs.
        let assignment_url = format!("{}/{}", url, Uuid::new_v4());
        self.arm()
            .put_unit(
                &assignment_url,
                &[("api-version", ROLE_ASSIGNMENTS_API_VERSION)],
                &json!({
                    "properties": {
                        "roleDefinitionId": role_definition_id,
                        "principalId": principal_id,
                        "principalType": "ServicePrincipal",
                    }
                }),
            )
            .await?;

        info!(
            "Assigned Owner to principal {} at {}",
            principal_id,
            context.scope()
        );

        Ok(EnsureOutcome::Created)
    }
}
