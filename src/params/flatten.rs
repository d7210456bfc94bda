//! Model parameters to flat vector.

use crate::error::AggregationError;
use crate::params::layout::ParameterLayout;
use crate::params::state::ParameterSource;
use crate::params::vector::FlatVector;

/// Flatten every parameter of `source` into one vector.
///
/// Parameters are visited in the source's declaration order; each tensor is
/// read in row-major (logical) order and appended. No arithmetic is applied,
/// so [`recover`](super::recover) returns bit-identical tensors.
///
/// # Errors
///
/// * [`AggregationError::EmptyModel`] if the source has no parameters
/// * [`AggregationError::Shape`] if a parameter has zero elements
pub fn flatten<S: ParameterSource + ?Sized>(
    source: &S,
) -> Result<(FlatVector, ParameterLayout), AggregationError> {
    let layout = ParameterLayout::of(source)?;

    let mut values = Vec::with_capacity(layout.total_len());
    for (_, tensor) in source.named_parameters() {
        values.extend(tensor.iter().copied());
    }

    Ok((FlatVector::from(values), layout))
}
