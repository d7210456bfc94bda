//! Aggregation audit log for post-hoc analysis.
//!
//! Records metadata about each aggregation round, enabling
//! reproducibility analysis and anomaly detection.

use serde::{Deserialize, Serialize};

use crate::aggregators::{AggregateResult, AggregationPolicy, TrimSpec};

/// Metadata for a single aggregation round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (0-indexed).
    pub round: usize,
    /// Number of clients that contributed.
    pub n_clients: usize,
    /// Length of the aggregated vector.
    pub n_params: usize,
    /// Policy identifier.
    pub policy: String,
    /// Trim setting (trimmed mean only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<TrimSpec>,
}

impl RoundRecord {
    /// Describe a completed round.
    pub fn new(round: usize, policy: &AggregationPolicy, result: &AggregateResult) -> Self {
        let trim = match *policy {
            AggregationPolicy::TrimmedMean { trim } => Some(trim),
            _ => None,
        };
        Self {
            round,
            n_clients: result.n_contributors,
            n_params: result.params.len(),
            policy: policy.name().to_string(),
            trim,
        }
    }
}

/// Append-only audit log of aggregation rounds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<RoundRecord>,
}

impl AuditLog {
    /// Create a new, empty audit log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry to the log.
    pub fn push(&mut self, entry: RoundRecord) {
        self.entries.push(entry);
    }

    /// Get all entries.
    pub fn entries(&self) -> &[RoundRecord] {
        &self.entries
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&RoundRecord> {
        self.entries.last()
    }

    /// Number of recorded rounds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the audit log to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
