//! Structured per-entry and per-run results.
//!
//! Instead of raw abort signals, each entry produces a report (success,
//! skipped steps, warnings, or the failing step and reason) so the outcome
//! of a many-subscription run stays inspectable after the fact.

use serde::Serialize;
use std::fmt::Write as _;

/// Result of one full run over the entry list.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub entries: Vec<EntryReport>,
}

/// Result of processing a single provisioning entry.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub subscription_name: String,
    pub outcome: EntryOutcome,
    /// Steps skipped because the state already existed.
    pub skipped: Vec<String>,
    /// Operational caveats, e.g. unverified admin consent.
    pub warnings: Vec<String>,
}

/// Terminal state of one entry.
#[derive(Debug, Serialize)]
pub enum EntryOutcome {
    /// All steps completed (or were skipped as already satisfied).
    Completed(IdentitySummary),
    /// A step failed; later steps for this entry were not attempted.
    Failed { step: String, reason: String },
}

/// The per-entry success artifact: the provisioned identity and, when
/// requested, its service connection.
#[derive(Debug, Serialize)]
pub struct IdentitySummary {
    pub display_name: String,
    pub application_id: String,
    pub tenant_id: String,
    pub subscription_id: String,
    pub connection: Option<ConnectionSummary>,
}

/// Details of the created-or-reused service connection.
#[derive(Debug, Serialize)]
pub struct ConnectionSummary {
    pub name: String,
    pub id: String,
    pub issuer: String,
    pub subject: String,
}

impl RunReport {
    /// Number of entries that completed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Completed(_)))
            .count()
    }

    /// Number of entries that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// Human-readable summary of the run.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Provisioning run: {} succeeded, {} failed",
            self.succeeded(),
            self.failed()
        );

        for entry in &self.entries {
            match &entry.outcome {
                EntryOutcome::Completed(summary) => {
                    let _ = writeln!(
                        out,
                        "  [ok]   {}: identity {} (app {}, tenant {}, subscription {})",
                        entry.subscription_name,
                        summary.display_name,
                        summary.application_id,
                        summary.tenant_id,
                        summary.subscription_id
                    );
                    if let Some(connection) = &summary.connection {
                        let _ = writeln!(
                            out,
                            "         connection {} ({}), issuer {}, subject {}",
                            connection.name, connection.id, connection.issuer, connection.subject
                        );
                    }
                }
                EntryOutcome::Failed { step, reason } => {
                    let _ = writeln!(
                        out,
                        "  [fail] {}: step '{}' failed: {}",
                        entry.subscription_name, step, reason
                    );
                }
            }

            for skipped in &entry.skipped {
                let _ = writeln!(out, "         skipped: {skipped}");
            }
            for warning in &entry.warnings {
                let _ = writeln!(out, "         warning: {warning}");
            }
        }

        out
    }
}
