//! FedAvg baseline aggregation (no Byzantine tolerance)
//!
//! Standard federated averaging as described by McMahan et al. (2017).
//! Vulnerable to even a single Byzantine client. Included as a baseline
//! for comparison against the robust methods.

use rayon::prelude::*;

use super::{check_dimensions, client_weights};
use crate::error::AggregationError;
use crate::math::ordered_sum;
use crate::params::FlatVector;

/// Weighted arithmetic mean of client vectors, coordinate by coordinate.
///
/// `output[i] = Σ w_c · v_c[i] / Σ w_c`. With `weights = None` every client
/// counts once and this is the plain mean.
///
/// Terms are accumulated in `f64` and the division by the total weight
/// happens once per coordinate.
///
/// # Arguments
///
/// * `updates` - Flattened client vectors, all of the same length
/// * `weights` - Optional raw, non-negative client weights (e.g. local
///   dataset sizes); they need not sum to one
///
/// # Errors
///
/// [`AggregationError::EmptyUpdates`], [`AggregationError::DimensionMismatch`],
/// [`AggregationError::WeightCountMismatch`], [`AggregationError::InvalidWeight`],
/// or [`AggregationError::ZeroWeight`] when all weights are zero.
pub fn fedavg<V>(updates: &[V], weights: Option<&[f32]>) -> Result<FlatVector, AggregationError>
where
    V: AsRef<[f32]> + Sync,
{
    let dim = check_dimensions(updates)?;
    let weights = client_weights(weights, updates.len())?;

    let total_weight = ordered_sum(&mut weights.clone());
    if total_weight == 0.0 {
        return Err(AggregationError::ZeroWeight);
    }

    let result: Vec<f32> = (0..dim)
        .into_par_iter()
        .map(|i| {
            let mut terms: Vec<f64> = updates
                .iter()
                .zip(&weights)
                .map(|(update, &w)| w * update.as_ref()[i] as f64)
                .collect();
            (ordered_sum(&mut terms) / total_weight) as f32
        })
        .collect();

    Ok(FlatVector::from(result))
}
