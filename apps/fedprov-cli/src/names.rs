//! Deterministic naming for identities, connections and federation subjects.

/// Display name of the workload identity for a subscription.
#[must_use]
pub fn identity_display_name(subscription_name: &str) -> String {
    format!("app-{subscription_name}-devops")
}

/// Name of the service connection bound to an identity.
#[must_use]
pub fn connection_name(identity_display_name: &str) -> String {
    format!("conn-{identity_display_name}")
}

/// Federation subject the CI/CD platform embeds in its tokens for a
/// service-connection-based credential.
///
/// Must match the platform convention exactly; a mismatch fails token
/// exchange at pipeline run time, which provisioning cannot detect.
#[must_use]
pub fn federation_subject(org: &str, project: &str, connection: &str) -> String {
    format!("sc://{org}/{project}/{connection}")
}
