//! Per-entry provisioning sequence.
//!
//! Drives the full cycle for each entry, strictly in order: subscription
//! resolution, identity resolve-or-create, password stripping, role
//! assignment, permission grants with best-effort consent and, when
//! requested, the service-connection state machine plus federated-credential
//! binding. A fatal error aborts only the current entry; nothing is rolled
//! back and nothing is retried.

use std::fmt;

use tracing::{error, info, warn};

use fedprov_devops::{DevOpsClient, EndpointRequest, ServiceEndpoint};
use fedprov_identity::{
    ApiPermission, ConsentOutcome, EnsureOutcome, FederatedCredentialSpec, IdentityClient,
    PermissionStatus, WorkloadIdentity,
};

use crate::config::ProvisioningEntry;
use crate::names;
use crate::report::{ConnectionSummary, EntryOutcome, EntryReport, IdentitySummary, RunReport};

/// A step failure, fatal for the current entry only.
#[derive(Debug)]
struct StepError {
    step: &'static str,
    reason: String,
}

impl StepError {
    fn new(step: &'static str, reason: impl fmt::Display) -> Self {
        Self {
            step,
            reason: reason.to_string(),
        }
    }
}

/// Drives the provisioning workflow over an ordered entry list.
pub struct Orchestrator {
    identity: IdentityClient,
    devops: DevOpsClient,
}

impl Orchestrator {
    pub fn new(identity: IdentityClient, devops: DevOpsClient) -> Self {
        Self { identity, devops }
    }

    /// Processes every entry in order; one entry fully completes or fails
    /// before the next begins.
    pub async fn run(&self, entries: &[ProvisioningEntry]) -> RunReport {
        let mut reports = Vec::with_capacity(entries.len());

        for entry in entries {
            info!("Processing entry '{}'", entry.subscription_name);
            reports.push(self.provision_entry(entry).await);
        }

        RunReport { entries: reports }
    }

    async fn provision_entry(&self, entry: &ProvisioningEntry) -> EntryReport {
        let mut skipped = Vec::new();
        let mut warnings = Vec::new();

        match self.try_provision(entry, &mut skipped, &mut warnings).await {
            Ok(summary) => EntryReport {
                subscription_name: entry.subscription_name.clone(),
                outcome: EntryOutcome::Completed(summary),
                skipped,
                warnings,
            },
            Err(e) => {
                error!(
                    "Entry '{}' failed at step '{}': {}",
                    entry.subscription_name, e.step, e.reason
                );
                EntryReport {
                    subscription_name: entry.subscription_name.clone(),
                    outcome: EntryOutcome::Failed {
                        step: e.step.to_string(),
                        reason: e.reason,
                    },
                    skipped,
                    warnings,
                }
            }
        }
    }

    async fn try_provision(
        &self,
        entry: &ProvisioningEntry,
        skipped: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> Result<IdentitySummary, StepError> {
        // 1-2. Resolve the subscription into an explicit per-entry context.
        let context = self
            .identity
            .resolve_subscription(&entry.subscription_name)
            .await
            .map_err(|e| StepError::new("resolve-subscription", e))?;

        // 3. Identity resolve-or-create, then drop password credentials.
        let display_name = names::identity_display_name(&entry.subscription_name);
        let identity = self
            .identity
            .resolve_or_create_identity(&display_name)
            .await
            .map_err(|e| StepError::new("resolve-identity", e))?;

        self.identity
            .strip_password_credentials(&identity)
            .await
            .map_err(|e| StepError::new("strip-passwords", e))?;

        // 4. Owner at subscription scope.
        let role_outcome = self
            .identity
            .ensure_role_assignment(&context, &identity.service_principal_object_id)
            .await
            .map_err(|e| StepError::new("ensure-role-assignment", e))?;
        if role_outcome == EnsureOutcome::AlreadyPresent {
            skipped.push("role-assignment".to_string());
        }

        // 5. Directory-read permission plus best-effort admin consent.
        let requested = [ApiPermission::directory_read_all()];
        let outcomes = self
            .identity
            .ensure_permissions(&identity, &requested)
            .await
            .map_err(|e| StepError::new("ensure-permissions", e))?;

        let mut grant_failures = Vec::new();
        for outcome in &outcomes {
            match &outcome.status {
                PermissionStatus::Skipped => skipped.push(format!(
                    "permission {}",
                    outcome.permission.permission_id
                )),
                PermissionStatus::Failed(reason) => grant_failures.push(format!(
                    "{}: {}",
                    outcome.permission.permission_id, reason
                )),
                PermissionStatus::Granted => {}
            }
        }
        if !grant_failures.is_empty() {
            return Err(StepError::new(
                "ensure-permissions",
                grant_failures.join("; "),
            ));
        }

        match self.identity.grant_admin_consent(&identity, &requested).await {
            ConsentOutcome::Requested => warnings.push(
                "admin consent requested; effectiveness is not verifiable at provisioning time"
                    .to_string(),
            ),
            ConsentOutcome::Failed(reason) => {
                warn!("Admin consent request failed: {}", reason);
                warnings.push(format!(
                    "admin consent could not be requested ({reason}); grant it manually"
                ));
            }
        }

        // 6. Per-entry success artifact.
        info!(
            "Provisioned identity '{}' (app {}, tenant {}) for subscription {}",
            identity.display_name,
            identity.application_id,
            identity.tenant_id,
            context.subscription_id
        );

        // 7. Service connection + federated credential, when requested.
        let connection = if entry.create_service_connection {
            Some(
                self.provision_connection(entry, &context, &identity, skipped)
                    .await?,
            )
        } else {
            info!(
                "Service connection not requested for '{}', skipping",
                entry.subscription_name
            );
            None
        };

        Ok(IdentitySummary {
            display_name: identity.display_name.clone(),
            application_id: identity.application_id.clone(),
            tenant_id: identity.tenant_id.clone(),
            subscription_id: context.subscription_id.clone(),
            connection,
        })
    }

    async fn provision_connection(
        &self,
        entry: &ProvisioningEntry,
        context: &fedprov_identity::SubscriptionContext,
        identity: &WorkloadIdentity,
        skipped: &mut Vec<String>,
    ) -> Result<ConnectionSummary, StepError> {
        // Validation guarantees these are present for connection entries.
        let org = entry
            .org_name
            .as_deref()
            .ok_or_else(|| StepError::new("resolve-project", "orgName missing"))?;
        let project_name = entry
            .project_name
            .as_deref()
            .ok_or_else(|| StepError::new("resolve-project", "projectName missing"))?;

        let project = self
            .devops
            .resolve_project(org, project_name)
            .await
            .map_err(|e| StepError::new("resolve-project", e))?;

        let connection_name = names::connection_name(&identity.display_name);

        let existing = self
            .devops
            .find_endpoint_by_name(org, project_name, &connection_name)
            .await
            .map_err(|e| StepError::new("find-service-connection", e))?;

        let (endpoint, reused) = match existing {
            Some(endpoint) => {
                warn!(
                    "Service connection '{}' already exists in {}/{}, reusing it",
                    connection_name, org, project_name
                );
                skipped.push("service-connection".to_string());
                (endpoint, true)
            }
            None => {
                let request = EndpointRequest {
                    name: connection_name.clone(),
                    subscription_id: context.subscription_id.clone(),
                    subscription_name: context.subscription_name.clone(),
                    tenant_id: identity.tenant_id.clone(),
                    service_principal_id: identity.application_id.clone(),
                    project: project.clone(),
                };
                let endpoint = self
                    .devops
                    .create_endpoint(org, &request)
                    .await
                    .map_err(|e| StepError::new("create-service-connection", e))?;
                (endpoint, false)
            }
        };

        // The issuer is platform-assigned and must be read back, never
        // constructed or cached across runs.
        let fetched: ServiceEndpoint = self
            .devops
            .get_endpoint(org, project_name, &endpoint.id)
            .await
            .map_err(|e| StepError::new("read-service-connection", e))?;

        let issuer = fetched.issuer().map(str::to_string).ok_or_else(|| {
            StepError::new(
                "read-service-connection",
                format!("service connection '{connection_name}' has no issuer URL"),
            )
        })?;

        let subject = names::federation_subject(org, project_name, &connection_name);

        // A reused connection does not imply the credential exists; a prior
        // run may have failed between endpoint creation and the bind.
        let bind_needed = if reused {
            let already_bound = self
                .identity
                .has_federated_credential(identity, &connection_name)
                .await
                .map_err(|e| StepError::new("find-federated-credential", e))?;
            if already_bound {
                skipped.push("federated-credential".to_string());
            } else {
                warn!(
                    "Reused service connection '{}' has no federated credential, binding it",
                    connection_name
                );
            }
            !already_bound
        } else {
            true
        };

        if bind_needed {
            let spec = FederatedCredentialSpec {
                name: connection_name.clone(),
                issuer: issuer.clone(),
                subject: subject.clone(),
            };
            self.identity
                .bind_federated_credential(identity, &spec)
                .await
                .map_err(|e| StepError::new("bind-federated-credential", e))?;
        }

        Ok(ConnectionSummary {
            name: connection_name,
            id: fetched.id,
            issuer,
            subject,
        })
    }
}
