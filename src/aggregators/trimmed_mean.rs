//! Coordinate-wise trimmed mean aggregation
//!
//! Achieves Byzantine tolerance by discarding the most extreme values of
//! every parameter coordinate before averaging what is left.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::check_dimensions;
use crate::error::AggregationError;
use crate::params::FlatVector;

/// How many values to drop from each end of a sorted coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimSpec {
    /// `k = floor(fraction · M)` for `M` clients; fraction must be in `0.0..=0.5`
    Fraction(f32),
    /// Fixed `k`, independent of the number of clients
    Count(usize),
}

impl TrimSpec {
    /// Resolve to a per-end trim count for `clients` contributors.
    ///
    /// Fails with [`AggregationError::InvalidTrimFraction`] for a fraction
    /// outside `0.0..=0.5` (including NaN) and with
    /// [`AggregationError::InvalidTrim`] when `2k >= clients`, i.e. when
    /// nothing would remain to average.
    pub fn trim_count(&self, clients: usize) -> Result<usize, AggregationError> {
        let k = match *self {
            TrimSpec::Fraction(f) => {
                if !(0.0..=0.5).contains(&f) {
                    return Err(AggregationError::InvalidTrimFraction(f));
                }
                fraction_of(f, clients)
            }
            TrimSpec::Count(k) => k,
        };

        if k.saturating_mul(2) >= clients {
            return Err(AggregationError::InvalidTrim { trim: k, clients });
        }
        Ok(k)
    }
}

/// `floor(f · clients)` where `f` is read as the decimal it was written as.
///
/// An f32 fraction like `0.42` is stored slightly below its decimal value, so
/// a product within f32 rounding error of a whole number is snapped to it
/// before flooring.
fn fraction_of(f: f32, clients: usize) -> usize {
    let product = f64::from(f) * clients as f64;
    let nearest = product.round();
    let tolerance = product.max(1.0) * f64::from(f32::EPSILON);
    if (product - nearest).abs() <= tolerance {
        nearest as usize
    } else {
        product.floor() as usize
    }
}

impl Default for TrimSpec {
    fn default() -> Self {
        TrimSpec::Fraction(super::DEFAULT_TRIM_FRACTION)
    }
}

/// Coordinate-wise trimmed mean aggregation.
///
/// For each parameter coordinate, sorts the `M` client values, discards the
/// lowest `k` and highest `k`, and averages the remaining `M - 2k` in `f64`.
/// `k = 0` is the plain mean; `k` close to `M / 2` approaches the median.
///
/// # Byzantine Tolerance
///
/// Each coordinate independently drops up to `k` attackers from each side,
/// so a minority of poisoned values per coordinate is discarded regardless
/// of the vector length.
///
/// # Arguments
///
/// * `updates` - Flattened client vectors, all of the same length
/// * `trim` - Trim fraction or absolute count per end
///
/// # Note
///
/// Weights are intentionally not supported here because sorting destroys the
/// correspondence between values and their original client weights. Use
/// [`super::fedavg`] for weighted aggregation without Byzantine tolerance.
pub fn trimmed_mean<V>(updates: &[V], trim: TrimSpec) -> Result<FlatVector, AggregationError>
where
    V: AsRef<[f32]> + Sync,
{
    let dim = check_dimensions(updates)?;
    let n_clients = updates.len();
    let n_trim = trim.trim_count(n_clients)?;
    let n_keep = (n_clients - 2 * n_trim) as f64;

    let result: Vec<f32> = (0..dim)
        .into_par_iter()
        .map(|i| {
            let mut values: Vec<f32> = updates.iter().map(|update| update.as_ref()[i]).collect();
            values.sort_unstable_by(f32::total_cmp);

            // Already in total order, so the summation order is fixed.
            let kept: f64 = values[n_trim..n_clients - n_trim]
                .iter()
                .map(|&v| v as f64)
                .sum();
            (kept / n_keep) as f32
        })
        .collect();

    Ok(FlatVector::from(result))
}
