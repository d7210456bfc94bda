//! Coordinate-wise aggregation algorithms for federated learning.
//!
//! Every aggregator takes a non-empty set of equal-length flat client
//! vectors and returns a newly allocated vector of the same length. Work is
//! split across coordinates with rayon; results are identical to a
//! sequential run and to any permutation of the client order.
//!
//! | Policy | Byzantine Tolerance | Weighted |
//! |--------|-------------------|----------|
//! | [`fedavg`] | None (baseline) | yes |
//! | [`median`] | < 50% per coordinate | no |
//! | [`trimmed_mean`] | k per end | no |
//! | [`weighted_sum`] | None | yes |

pub mod fedavg;
pub mod median;
pub mod sum;
pub mod trimmed_mean;

pub use fedavg::fedavg;
pub use median::median;
pub use sum::weighted_sum;
pub use trimmed_mean::{trimmed_mean, TrimSpec};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::diagnostics::{AuditLog, RoundRecord};
use crate::error::AggregationError;
use crate::params::FlatVector;

/// Trim fraction used when a trimmed-mean policy is named without one.
pub const DEFAULT_TRIM_FRACTION: f32 = 0.2;

/// Scale used when a scaled-sum policy is named without one.
pub const DEFAULT_SCALE: f32 = 1.0;

/// One client's flattened parameters for the current round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientUpdate {
    /// Client identifier, only used for diagnostics
    pub client_id: String,
    /// Flattened parameters, laid out by the round's canonical layout
    pub params: FlatVector,
    /// Raw non-negative weight (e.g. local dataset size); `None` means 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

impl ClientUpdate {
    /// Unweighted update.
    pub fn new(client_id: impl Into<String>, params: impl Into<FlatVector>) -> Self {
        Self {
            client_id: client_id.into(),
            params: params.into(),
            weight: None,
        }
    }

    /// Attach a raw weight.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Effective weight (1.0 when unset).
    pub fn weight(&self) -> f32 {
        self.weight.unwrap_or(1.0)
    }
}

impl AsRef<[f32]> for ClientUpdate {
    fn as_ref(&self) -> &[f32] {
        self.params.as_slice()
    }
}

/// Output of one aggregation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Aggregated flat vector, same length as every input
    pub params: FlatVector,
    /// Number of client updates that contributed
    pub n_contributors: usize,
}

/// Closed set of aggregation policies.
///
/// Adding a policy means adding a variant here; every `match` on it is then
/// checked by the compiler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Weighted FedAvg (no Byzantine tolerance, baseline)
    #[default]
    FedAvg,
    /// Coordinate-wise median
    Median,
    /// Coordinate-wise trimmed mean
    TrimmedMean {
        /// Values dropped from each end per coordinate
        trim: TrimSpec,
    },
    /// Coordinate-wise weighted sum
    Sum,
    /// Coordinate-wise weighted sum times a constant
    ScaledSum {
        /// Multiplier applied after summing
        scale: f32,
    },
}

impl AggregationPolicy {
    /// Canonical identifier.
    pub fn name(&self) -> &'static str {
        match self {
            AggregationPolicy::FedAvg => "fedavg",
            AggregationPolicy::Median => "median",
            AggregationPolicy::TrimmedMean { .. } => "trimmed_mean",
            AggregationPolicy::Sum => "sum",
            AggregationPolicy::ScaledSum { .. } => "scaled_sum",
        }
    }

    /// Whether client weights influence the result.
    pub fn uses_weights(&self) -> bool {
        match self {
            AggregationPolicy::FedAvg
            | AggregationPolicy::Sum
            | AggregationPolicy::ScaledSum { .. } => true,
            AggregationPolicy::Median | AggregationPolicy::TrimmedMean { .. } => false,
        }
    }

    /// Aggregate one round of client updates under this policy.
    ///
    /// Structural errors are wrapped in [`AggregationError::Policy`] so the
    /// caller sees which policy rejected the round; use
    /// [`AggregationError::root_cause`] to match on the underlying kind.
    pub fn aggregate(&self, updates: &[ClientUpdate]) -> Result<AggregateResult, AggregationError> {
        debug!(
            policy = self.name(),
            clients = updates.len(),
            params = updates.first().map_or(0, |u| u.params.len()),
            "aggregating round"
        );

        let weights: Vec<f32> = updates.iter().map(ClientUpdate::weight).collect();
        let result = match *self {
            AggregationPolicy::FedAvg => fedavg(updates, Some(&weights)),
            AggregationPolicy::Median => median(updates),
            AggregationPolicy::TrimmedMean { trim } => trimmed_mean(updates, trim),
            AggregationPolicy::Sum => weighted_sum(updates, Some(&weights), 1.0),
            AggregationPolicy::ScaledSum { scale } => weighted_sum(updates, Some(&weights), scale),
        };

        let params = result.map_err(|e| {
            debug!(policy = self.name(), error = %e, "aggregation rejected");
            AggregationError::Policy {
                policy: self.name(),
                source: Box::new(e),
            }
        })?;

        trace!(policy = self.name(), len = params.len(), "aggregation complete");
        Ok(AggregateResult {
            params,
            n_contributors: updates.len(),
        })
    }
}

/// Prints the canonical identifier only. Parameters such as the trim or the
/// scale are not included, so parsing the output back yields the defaults;
/// use the serde form to persist a fully parameterised policy.
impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregationPolicy {
    type Err = AggregationError;

    /// Parse a policy identifier, using default parameters where the policy
    /// takes any.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fedavg" | "average" | "avg" | "mean" => Ok(AggregationPolicy::FedAvg),
            "median" => Ok(AggregationPolicy::Median),
            "trimmed_mean" | "trimmed-mean" | "trmean" => Ok(AggregationPolicy::TrimmedMean {
                trim: TrimSpec::default(),
            }),
            "sum" => Ok(AggregationPolicy::Sum),
            "scaled_sum" | "scaled-sum" => Ok(AggregationPolicy::ScaledSum {
                scale: DEFAULT_SCALE,
            }),
            _ => Err(AggregationError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Round-aware aggregator for a training driver.
///
/// Wraps a fixed [`AggregationPolicy`] and records every successful round in
/// an [`AuditLog`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FederatedAggregator {
    policy: AggregationPolicy,
    round: usize,
    audit: AuditLog,
}

impl FederatedAggregator {
    /// Create a new aggregator starting at round 0.
    pub fn new(policy: AggregationPolicy) -> Self {
        Self {
            policy,
            round: 0,
            audit: AuditLog::new(),
        }
    }

    /// Policy in use.
    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Index of the next round to be aggregated.
    pub fn round(&self) -> usize {
        self.round
    }

    /// Rounds aggregated so far.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Aggregate the next round.
    ///
    /// A rejected round is not recorded and does not advance the counter, so
    /// the driver can drop a client and retry the same round.
    pub fn aggregate(&mut self, updates: &[ClientUpdate]) -> Result<AggregateResult, AggregationError> {
        let result = self.policy.aggregate(updates)?;
        self.audit
            .push(RoundRecord::new(self.round, &self.policy, &result));
        self.round += 1;
        Ok(result)
    }
}

/// Validate that `updates` is non-empty and equal-length; return the length.
pub(crate) fn check_dimensions<V: AsRef<[f32]>>(updates: &[V]) -> Result<usize, AggregationError> {
    let first = updates.first().ok_or(AggregationError::EmptyUpdates)?;
    let dim = first.as_ref().len();

    for (client, update) in updates.iter().enumerate().skip(1) {
        let actual = update.as_ref().len();
        if actual != dim {
            return Err(AggregationError::DimensionMismatch {
                client,
                expected: dim,
                actual,
            });
        }
    }
    Ok(dim)
}

/// Resolve optional raw weights to one finite, non-negative `f64` per client.
pub(crate) fn client_weights(
    weights: Option<&[f32]>,
    n_clients: usize,
) -> Result<Vec<f64>, AggregationError> {
    let Some(weights) = weights else {
        return Ok(vec![1.0; n_clients]);
    };

    if weights.len() != n_clients {
        return Err(AggregationError::WeightCountMismatch {
            updates: n_clients,
            weights: weights.len(),
        });
    }

    weights
        .iter()
        .enumerate()
        .map(|(client, &weight)| {
            if weight.is_finite() && weight >= 0.0 {
                Ok(weight as f64)
            } else {
                Err(AggregationError::InvalidWeight { client, weight })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updates(values: &[f32]) -> Vec<ClientUpdate> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ClientUpdate::new(format!("client_{}", i), vec![v]))
            .collect()
    }

    #[test]
    fn test_policy_trimmed_mean() {
        let policy = AggregationPolicy::TrimmedMean {
            trim: TrimSpec::Fraction(0.2),
        };
        let result = policy.aggregate(&updates(&[1.0, 1.1, 0.9, 1.0, 100.0])).unwrap();
        assert!(result.params[0] < 2.0, "Should reject outlier");
        assert_eq!(result.n_contributors, 5);
    }

    #[test]
    fn test_policy_median() {
        let result = AggregationPolicy::Median
            .aggregate(&updates(&[1.0, 2.0, 100.0]))
            .unwrap();
        assert_eq!(result.params[0], 2.0);
    }

    #[test]
    fn test_policy_fedavg_uses_update_weights() {
        let updates = vec![
            ClientUpdate::new("a", vec![0.0]),
            ClientUpdate::new("b", vec![10.0]).with_weight(3.0),
        ];
        let result = AggregationPolicy::FedAvg.aggregate(&updates).unwrap();
        assert_eq!(result.params[0], 7.5);
    }

    #[test]
    fn test_policy_median_ignores_weights() {
        let updates = vec![
            ClientUpdate::new("a", vec![1.0]).with_weight(100.0),
            ClientUpdate::new("b", vec![2.0]),
            ClientUpdate::new("c", vec![3.0]),
        ];
        let result = AggregationPolicy::Median.aggregate(&updates).unwrap();
        assert_eq!(result.params[0], 2.0);
        assert!(!AggregationPolicy::Median.uses_weights());
    }

    #[test]
    fn test_policy_sum_and_scaled_sum() {
        let round = updates(&[1.0, 2.0, 3.0]);
        let sum = AggregationPolicy::Sum.aggregate(&round).unwrap();
        assert_eq!(sum.params[0], 6.0);

        let doubled = AggregationPolicy::ScaledSum { scale: 2.0 }
            .aggregate(&round)
            .unwrap();
        assert_eq!(doubled.params[0], 12.0);
    }

    #[test]
    fn test_policy_error_carries_name() {
        let err = AggregationPolicy::Median.aggregate(&[]).unwrap_err();
        assert_eq!(err.root_cause(), &AggregationError::EmptyUpdates);
        assert!(err.to_string().starts_with("median aggregation failed"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fedavg".parse::<AggregationPolicy>(), Ok(AggregationPolicy::FedAvg));
        assert_eq!("Average".parse::<AggregationPolicy>(), Ok(AggregationPolicy::FedAvg));
        assert_eq!("median".parse::<AggregationPolicy>(), Ok(AggregationPolicy::Median));
        assert_eq!(
            "trmean".parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::TrimmedMean {
                trim: TrimSpec::Fraction(DEFAULT_TRIM_FRACTION)
            })
        );
        assert_eq!("sum".parse::<AggregationPolicy>(), Ok(AggregationPolicy::Sum));
        assert_eq!(
            "scaled-sum".parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::ScaledSum { scale: 1.0 })
        );
        assert_eq!(
            "krum".parse::<AggregationPolicy>(),
            Err(AggregationError::UnknownPolicy("krum".to_string()))
        );
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [
            AggregationPolicy::FedAvg,
            AggregationPolicy::Median,
            AggregationPolicy::Sum,
        ] {
            assert_eq!(policy.to_string().parse::<AggregationPolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_policy_display_drops_parameters() {
        let trimmed = AggregationPolicy::TrimmedMean {
            trim: TrimSpec::Count(2),
        };
        assert_eq!(trimmed.to_string(), "trimmed_mean");
        assert_eq!(
            trimmed.to_string().parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::TrimmedMean {
                trim: TrimSpec::default()
            })
        );

        let scaled = AggregationPolicy::ScaledSum { scale: 2.0 };
        assert_eq!(scaled.to_string(), "scaled_sum");
        assert_eq!(
            scaled.to_string().parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::ScaledSum {
                scale: DEFAULT_SCALE
            })
        );

        // The serde form keeps them
        let json = serde_json::to_string(&scaled).unwrap();
        assert_eq!(serde_json::from_str::<AggregationPolicy>(&json).unwrap(), scaled);
    }

    #[test]
    fn test_policy_serde() {
        let policy = AggregationPolicy::TrimmedMean {
            trim: TrimSpec::Count(2),
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(json, r#"{"policy":"trimmed_mean","trim":{"count":2}}"#);
        let back: AggregationPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn test_federated_aggregator_counts_rounds() {
        let mut agg = FederatedAggregator::new(AggregationPolicy::FedAvg);
        agg.aggregate(&updates(&[1.0, 3.0])).unwrap();
        agg.aggregate(&updates(&[2.0, 4.0])).unwrap();

        assert_eq!(agg.round(), 2);
        assert_eq!(agg.audit().len(), 2);
        assert_eq!(agg.audit().entries()[1].round, 1);
    }

    #[test]
    fn test_federated_aggregator_failed_round_not_recorded() {
        let mut agg = FederatedAggregator::new(AggregationPolicy::Median);
        let bad = vec![
            ClientUpdate::new("a", vec![1.0, 2.0]),
            ClientUpdate::new("b", vec![1.0]),
        ];
        assert!(agg.aggregate(&bad).is_err());
        assert_eq!(agg.round(), 0);
        assert!(agg.audit().is_empty());
    }

    #[test]
    fn test_check_dimensions_reports_client() {
        let vs: Vec<Vec<f32>> = vec![vec![1.0], vec![1.0], vec![1.0, 2.0]];
        assert_eq!(
            check_dimensions(&vs),
            Err(AggregationError::DimensionMismatch {
                client: 2,
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_client_weights_default_to_one() {
        assert_eq!(client_weights(None, 3), Ok(vec![1.0, 1.0, 1.0]));
        assert!(matches!(
            client_weights(Some(&[1.0, f32::NAN]), 2),
            Err(AggregationError::InvalidWeight { client: 1, .. })
        ));
    }
}
