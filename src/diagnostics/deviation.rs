//! Distance of each client update from the round's aggregate.

use crate::error::AggregationError;
use crate::math::l2_distance;
use crate::params::FlatVector;

/// L2 distance from each update to `aggregate`, in update order.
///
/// Under a robust policy, clients whose updates were trimmed away tend to
/// stand out with a large deviation.
pub fn client_deviations<V: AsRef<[f32]>>(
    updates: &[V],
    aggregate: &FlatVector,
) -> Result<Vec<f32>, AggregationError> {
    updates
        .iter()
        .enumerate()
        .map(|(client, update)| {
            let update = update.as_ref();
            if update.len() != aggregate.len() {
                return Err(AggregationError::DimensionMismatch {
                    client,
                    expected: aggregate.len(),
                    actual: update.len(),
                });
            }
            Ok(l2_distance(update, aggregate.as_slice()))
        })
        .collect()
}
