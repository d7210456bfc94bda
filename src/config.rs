//! Aggregation settings as read from a driver's experiment config.

use serde::{Deserialize, Serialize};

use crate::aggregators::{AggregationPolicy, TrimSpec, DEFAULT_SCALE};
use crate::error::AggregationError;

/// Policy selection plus its optional parameters.
///
/// ```rust
/// use fl_aggregation::{AggregationConfig, AggregationPolicy, TrimSpec};
///
/// let config: AggregationConfig =
///     serde_json::from_str(r#"{"policy": "trmean", "trim_count": 1}"#).unwrap();
/// assert_eq!(
///     config.policy().unwrap(),
///     AggregationPolicy::TrimmedMean { trim: TrimSpec::Count(1) }
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    /// Policy identifier, e.g. `fedavg`, `median`, `trimmed_mean`
    pub policy: String,
    /// Trim fraction per end (trimmed mean)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_fraction: Option<f32>,
    /// Absolute trim count per end (trimmed mean); wins over `trim_fraction`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_count: Option<usize>,
    /// Multiplier (scaled sum)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::new("fedavg")
    }
}

impl AggregationConfig {
    /// Config naming `policy` with default parameters.
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            trim_fraction: None,
            trim_count: None,
            scale: None,
        }
    }

    /// Set the trim fraction.
    pub fn with_trim_fraction(mut self, fraction: f32) -> Self {
        self.trim_fraction = Some(fraction);
        self
    }

    /// Set an absolute trim count.
    pub fn with_trim_count(mut self, count: usize) -> Self {
        self.trim_count = Some(count);
        self
    }

    /// Set the scaled-sum multiplier.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Resolve into a concrete policy.
    ///
    /// Parameters that do not apply to the named policy are ignored. A trim
    /// fraction outside `0.0..=0.5` or a non-finite scale is rejected here
    /// rather than at aggregation time.
    pub fn policy(&self) -> Result<AggregationPolicy, AggregationError> {
        let policy = match self.policy.parse::<AggregationPolicy>()? {
            AggregationPolicy::TrimmedMean { trim } => {
                let trim = match (self.trim_count, self.trim_fraction) {
                    (Some(count), _) => TrimSpec::Count(count),
                    (None, Some(fraction)) => {
                        if !(0.0..=0.5).contains(&fraction) {
                            return Err(AggregationError::InvalidTrimFraction(fraction));
                        }
                        TrimSpec::Fraction(fraction)
                    }
                    (None, None) => trim,
                };
                AggregationPolicy::TrimmedMean { trim }
            }
            AggregationPolicy::ScaledSum { .. } => {
                let scale = self.scale.unwrap_or(DEFAULT_SCALE);
                if !scale.is_finite() {
                    return Err(AggregationError::InvalidScale(scale));
                }
                AggregationPolicy::ScaledSum { scale }
            }
            other => other,
        };
        Ok(policy)
    }
}
