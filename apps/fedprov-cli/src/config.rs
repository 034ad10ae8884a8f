//! Provisioning entries file: loading and validation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{CliError, CliResult};

/// One provisioning entry; drives one full per-subscription cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProvisioningEntry {
    /// Subscription display name.
    pub subscription_name: String,
    /// Whether to create a CI/CD service connection for this subscription.
    #[serde(deserialize_with = "bool_or_string")]
    pub create_service_connection: bool,
    /// CI/CD organization name; required when a connection is requested.
    #[serde(default)]
    pub org_name: Option<String>,
    /// CI/CD project name; required when a connection is requested.
    #[serde(default)]
    pub project_name: Option<String>,
}

/// Loads the ordered entry list from a YAML file.
pub fn load_entries(path: &Path) -> CliResult<Vec<ProvisioningEntry>> {
    let raw = fs::read_to_string(path)?;
    let entries: Vec<ProvisioningEntry> = serde_yaml::from_str(&raw)?;
    Ok(entries)
}

/// Validates the whole entry list before any provisioning begins.
///
/// Schema or cross-field violations are whole-run fatal; no entry is
/// processed when validation fails.
pub fn validate_entries(entries: &[ProvisioningEntry]) -> CliResult<()> {
    if entries.is_empty() {
        return Err(CliError::Config("entries file contains no entries".into()));
    }

    for (index, entry) in entries.iter().enumerate() {
        if entry.subscription_name.trim().is_empty() {
            return Err(CliError::Config(format!(
                "entry {index}: subscriptionName must not be empty"
            )));
        }

        if entry.create_service_connection {
            if is_blank(&entry.org_name) {
                return Err(CliError::Config(format!(
                    "entry {index} ('{}'): orgName is required when createServiceConnection is true",
                    entry.subscription_name
                )));
            }
            if is_blank(&entry.project_name) {
                return Err(CliError::Config(format!(
                    "entry {index} ('{}'): projectName is required when createServiceConnection is true",
                    entry.subscription_name
                )));
            }
        }
    }

    Ok(())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Accepts `true`/`false` either as a YAML boolean or as the string form
/// legacy entry files use.
fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected 'true' or 'false', got '{other}'"
            ))),
        },
    }
}
