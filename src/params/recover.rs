//! Flat vector back to shaped tensors.

use ndarray::{ArrayD, IxDyn};

use crate::error::AggregationError;
use crate::params::layout::ParameterLayout;
use crate::params::state::{ParameterSource, StateDict};
use crate::params::vector::FlatVector;

/// Slice `flat` by `layout` and reshape each slice to the matching parameter
/// of `reference`.
///
/// Shapes come from the live reference model; the layout only supplies
/// offsets. Tensors are returned in the reference's traversal order.
///
/// # Errors
///
/// * [`AggregationError::LengthMismatch`] if `flat` does not span the layout
/// * [`AggregationError::LayoutMismatch`] if the reference lists a different
///   number of parameters than the layout
/// * [`AggregationError::ShapeMismatch`] if a slice cannot fill the reference
///   parameter's shape
pub fn recover<S: ParameterSource + ?Sized>(
    flat: &FlatVector,
    layout: &ParameterLayout,
    reference: &S,
) -> Result<Vec<ArrayD<f32>>, AggregationError> {
    if flat.len() != layout.total_len() {
        return Err(AggregationError::LengthMismatch {
            expected: layout.total_len(),
            actual: flat.len(),
        });
    }

    let params = reference.named_parameters();
    if params.len() != layout.len() {
        return Err(AggregationError::LayoutMismatch {
            index: params.len().min(layout.len()),
            reason: format!(
                "layout has {} parameters, reference has {}",
                layout.len(),
                params.len()
            ),
        });
    }

    layout
        .entries()
        .iter()
        .zip(params)
        .map(|(entry, (_, tensor))| {
            let shape = tensor.shape();
            let needed: usize = shape.iter().product();
            if entry.num_elements() != needed {
                return Err(AggregationError::ShapeMismatch {
                    name: entry.name.clone(),
                    expected: entry.num_elements(),
                    actual: needed,
                });
            }

            let values = flat.as_slice()[entry.range()].to_vec();
            ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| {
                AggregationError::ShapeMismatch {
                    name: entry.name.clone(),
                    expected: entry.num_elements(),
                    actual: needed,
                }
            })
        })
        .collect()
}

/// [`recover`], keyed by the reference model's parameter names.
pub fn recover_state<S: ParameterSource + ?Sized>(
    flat: &FlatVector,
    layout: &ParameterLayout,
    reference: &S,
) -> Result<StateDict, AggregationError> {
    let tensors = recover(flat, layout, reference)?;
    Ok(reference
        .named_parameters()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .zip(tensors)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::flatten;
    use ndarray::array;

    fn model() -> StateDict {
        vec![
            ("conv.weight", array![[[1.0f32, 2.0], [3.0, 4.0]]].into_dyn()),
            ("conv.bias", array![0.5f32].into_dyn()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_recover_matches_reference_order() {
        let model = model();
        let (flat, layout) = flatten(&model).unwrap();

        let tensors = recover(&flat, &layout, &model).unwrap();
        assert_eq!(tensors.len(), 2);
        assert_eq!(tensors[0].shape(), &[1, 2, 2]);
        assert_eq!(tensors[1], array![0.5f32].into_dyn());
    }

    #[test]
    fn test_recover_length_mismatch() {
        let model = model();
        let (_, layout) = flatten(&model).unwrap();
        let short = FlatVector::from(vec![0.0; 4]);

        assert_eq!(
            recover(&short, &layout, &model),
            Err(AggregationError::LengthMismatch {
                expected: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn test_recover_diverged_reference() {
        let model = model();
        let (flat, layout) = flatten(&model).unwrap();

        // Same parameter count, different split between the two tensors.
        let other: StateDict = vec![
            ("conv.weight", array![[1.0f32, 2.0, 3.0]].into_dyn()),
            ("conv.bias", array![0.0f32, 0.0].into_dyn()),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            recover(&flat, &layout, &other),
            Err(AggregationError::ShapeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_recover_state_keeps_names() {
        let model = model();
        let (flat, layout) = flatten(&model).unwrap();

        let state = recover_state(&flat, &layout, &model).unwrap();
        assert_eq!(state, model);
    }
}
