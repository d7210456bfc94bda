//! Coordinate-wise (scaled) sum
//!
//! Adds client vectors without normalising, e.g. to accumulate client
//! deltas that are already pre-scaled by the driver. Offers no Byzantine
//! tolerance.

use rayon::prelude::*;

use super::{check_dimensions, client_weights};
use crate::error::AggregationError;
use crate::math::ordered_sum;
use crate::params::FlatVector;

/// `output[i] = scale · Σ w_c · v_c[i]`.
///
/// With `weights = None` every client counts once. Zero weights are allowed
/// here since no division takes place.
///
/// # Errors
///
/// [`AggregationError::InvalidScale`] for a non-finite `scale`, plus the
/// dimension and weight checks shared with [`super::fedavg`].
pub fn weighted_sum<V>(
    updates: &[V],
    weights: Option<&[f32]>,
    scale: f32,
) -> Result<FlatVector, AggregationError>
where
    V: AsRef<[f32]> + Sync,
{
    if !scale.is_finite() {
        return Err(AggregationError::InvalidScale(scale));
    }
    let dim = check_dimensions(updates)?;
    let weights = client_weights(weights, updates.len())?;
    let scale = scale as f64;

    let result: Vec<f32> = (0..dim)
        .into_par_iter()
        .map(|i| {
            let mut terms: Vec<f64> = updates
                .iter()
                .zip(&weights)
                .map(|(update, &w)| w * update.as_ref()[i] as f64)
                .collect();
            (scale * ordered_sum(&mut terms)) as f32
        })
        .collect();

    Ok(FlatVector::from(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sum() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let result = weighted_sum(&updates, None, 1.0).unwrap();
        assert_eq!(result.as_slice(), &[9.0, 12.0]);
    }

    #[test]
    fn test_scaled_weighted_sum() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0], vec![2.0]];
        let weights = vec![2.0, 0.5];
        // 0.5 * (2*1 + 0.5*2) = 1.5
        let result = weighted_sum(&updates, Some(&weights), 0.5).unwrap();
        assert_eq!(result[0], 1.5);
    }

    #[test]
    fn test_zero_weights_allowed() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0], vec![2.0]];
        let weights = vec![0.0, 0.0];
        let result = weighted_sum(&updates, Some(&weights), 1.0).unwrap();
        assert_eq!(result[0], 0.0);
    }

    #[test]
    fn test_non_finite_scale() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0]];
        assert!(matches!(
            weighted_sum(&updates, None, f32::INFINITY),
            Err(AggregationError::InvalidScale(_))
        ));
    }
}
