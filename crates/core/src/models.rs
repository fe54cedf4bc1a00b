//! Domain model types for the migration pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A repository selected for migration.
///
/// Produced by the inventory stage with `destination_url` unset; the
/// reconciler fills it in once the destination repository is confirmed or
/// created. Discarded after the transfer stage -- nothing persists across
/// runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationCandidate {
    /// Repository name; matches an allow-list entry and the source project
    /// name.
    pub name: String,

    /// HTTP clone URL at the source (credentials injected separately).
    pub source_url: String,

    /// Canonical clone URL at the destination, once reconciled.
    pub destination_url: Option<String>,
}

impl MigrationCandidate {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            destination_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Outcome of destination reconciliation for one candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// The repository already exists at the destination; the transfer stage
    /// must not run.
    Skipped,
    /// The repository was created (or confirmed created by a concurrent
    /// writer) and is ready to receive the mirror push.
    Created,
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped"),
            Self::Created => write!(f, "created"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// A transfer that failed; the run continues past these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFailure {
    pub name: String,
    pub reason: String,
}

/// Statistics from a single migration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Candidates resolved from the source listing.
    pub candidates: usize,
    /// Repositories fully mirrored this run.
    pub migrated: usize,
    /// Repositories that already existed at the destination.
    pub skipped: usize,
    /// Per-repository transfer failures (non-fatal).
    pub failed: Vec<TransferFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// True when every candidate was either migrated or skipped.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One row of a read-only migration plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    /// Whether a same-named repository already exists at the destination
    /// (a run would skip it).
    pub exists_at_destination: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_action_display() {
        assert_eq!(ReconcileAction::Skipped.to_string(), "skipped");
        assert_eq!(ReconcileAction::Created.to_string(), "created");
    }

    #[test]
    fn test_summary_is_clean() {
        let mut summary = RunSummary::default();
        assert!(summary.is_clean());
        summary.failed.push(TransferFailure {
            name: "alpha".into(),
            reason: "clone failed".into(),
        });
        assert!(!summary.is_clean());
    }
}
