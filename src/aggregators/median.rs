//! Coordinate-wise median aggregation
//!
//! More robust than trimmed mean: the median of a coordinate stays inside
//! the honest range as long as honest clients are the strict majority.

use rayon::prelude::*;

use super::check_dimensions;
use crate::error::AggregationError;
use crate::params::FlatVector;

/// Coordinate-wise median aggregation.
///
/// For each parameter coordinate, sorts the client values ascending and
/// takes the middle one. With an even number of clients the result is the
/// arithmetic mean of the two middle values, computed in `f64`.
///
/// Values are ordered with [`f32::total_cmp`], so the result does not depend
/// on client order even if a client sends NaN.
///
/// # Byzantine Tolerance
///
/// Up to (but excluding) 50% Byzantine clients per coordinate.
///
/// # Arguments
///
/// * `updates` - Flattened client vectors, all of the same length
pub fn median<V>(updates: &[V]) -> Result<FlatVector, AggregationError>
where
    V: AsRef<[f32]> + Sync,
{
    let dim = check_dimensions(updates)?;

    let result: Vec<f32> = (0..dim)
        .into_par_iter()
        .map(|i| {
            let mut values: Vec<f32> = updates.iter().map(|update| update.as_ref()[i]).collect();
            values.sort_unstable_by(f32::total_cmp);

            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                ((values[mid - 1] as f64 + values[mid] as f64) / 2.0) as f32
            } else {
                values[mid]
            }
        })
        .collect();

    Ok(FlatVector::from(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_count() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0], vec![2.0], vec![3.0]];
        let result = median(&updates).unwrap();
        assert_eq!(result[0], 2.0);
    }

    #[test]
    fn test_median_even_count() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let result = median(&updates).unwrap();
        assert_eq!(result[0], 2.5);
    }

    #[test]
    fn test_median_rejects_outlier() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![1000.0]];
        let result = median(&updates).unwrap();
        assert_eq!(result[0], 3.0);
    }

    #[test]
    fn test_median_30_percent_byzantine() {
        // 7 honest (~1.0), 3 Byzantine (100.0)
        let mut updates: Vec<Vec<f32>> = (0..7).map(|i| vec![1.0 + i as f32 * 0.1]).collect();
        updates.extend(vec![vec![100.0]; 3]);

        let result = median(&updates).unwrap();
        // Sorted: [1.0 .. 1.6, 100, 100, 100] -> (1.4 + 1.5) / 2
        assert!((result[0] - 1.45).abs() < 1e-6, "Expected 1.45, got {}", result[0]);
    }

    #[test]
    fn test_median_empty() {
        let updates: Vec<Vec<f32>> = vec![];
        assert_eq!(median(&updates), Err(AggregationError::EmptyUpdates));
    }

    #[test]
    fn test_median_dimension_mismatch() {
        let updates: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![1.0]];
        assert_eq!(
            median(&updates),
            Err(AggregationError::DimensionMismatch {
                client: 1,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_median_per_coordinate() {
        let updates: Vec<Vec<f32>> = vec![
            vec![1.0, 30.0, 200.0, 1000.0],
            vec![2.0, 10.0, 300.0, 3000.0],
            vec![3.0, 20.0, 100.0, 2000.0],
        ];
        let result = median(&updates).unwrap();
        assert_eq!(result.as_slice(), &[2.0, 20.0, 200.0, 2000.0]);
    }

    #[test]
    fn test_median_nan_is_order_independent() {
        let a: Vec<Vec<f32>> = vec![vec![f32::NAN], vec![1.0], vec![2.0]];
        let b: Vec<Vec<f32>> = vec![vec![2.0], vec![f32::NAN], vec![1.0]];
        let ra = median(&a).unwrap();
        let rb = median(&b).unwrap();
        assert_eq!(ra[0].to_bits(), rb[0].to_bits());
        assert_eq!(ra[0], 2.0);
    }
}
