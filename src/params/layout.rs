//! Offset map between named tensors and a flat vector.

use std::ops::Range;

use ndarray::{ArrayD, IxDyn};
use serde::Serialize;

use crate::error::AggregationError;
use crate::params::state::{ParameterSource, StateDict};
use crate::params::vector::FlatVector;

/// Where one parameter lives inside a flat vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    /// Parameter name
    pub name: String,
    /// Tensor shape at flattening time
    pub shape: Vec<usize>,
    /// First flat index (inclusive)
    pub start: usize,
    /// Last flat index (exclusive)
    pub end: usize,
}

impl LayoutEntry {
    /// Number of scalar elements covered.
    pub fn num_elements(&self) -> usize {
        self.end - self.start
    }

    /// Flat index range covered.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Ordered, contiguous, non-overlapping offset map for one model architecture.
///
/// Entries are only built by this crate, so offsets always start at zero and
/// each entry begins where the previous one ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterLayout {
    entries: Vec<LayoutEntry>,
}

impl ParameterLayout {
    /// Build a layout from `(name, shape)` pairs, in traversal order.
    ///
    /// Fails with [`AggregationError::EmptyModel`] for no parameters and
    /// [`AggregationError::Shape`] for a parameter with zero elements or an
    /// element count that overflows `usize`.
    pub fn from_shapes<N, I>(shapes: I) -> Result<Self, AggregationError>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<usize>)>,
    {
        let mut entries: Vec<LayoutEntry> = Vec::new();
        let mut offset: usize = 0;

        for (name, shape) in shapes {
            let name = name.into();
            let size = shape
                .iter()
                .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
                .filter(|&size| size > 0);
            let Some(end) = size.and_then(|size| offset.checked_add(size)) else {
                return Err(AggregationError::Shape { name, shape });
            };
            if entries.iter().any(|e| e.name == name) {
                return Err(AggregationError::LayoutMismatch {
                    index: entries.len(),
                    reason: format!("duplicate parameter name '{}'", name),
                });
            }
            entries.push(LayoutEntry {
                name,
                shape,
                start: offset,
                end,
            });
            offset = end;
        }

        if entries.is_empty() {
            return Err(AggregationError::EmptyModel);
        }
        Ok(Self { entries })
    }

    /// Derive the layout of a model without copying its values.
    pub fn of<S: ParameterSource + ?Sized>(source: &S) -> Result<Self, AggregationError> {
        Self::from_shapes(
            source
                .named_parameters()
                .into_iter()
                .map(|(name, tensor)| (name, tensor.shape().to_vec())),
        )
    }

    /// Entries in traversal order.
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    /// Entry for `name`, if present.
    pub fn entry(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed layout; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the flat vector this layout describes.
    pub fn total_len(&self) -> usize {
        self.entries.last().map_or(0, |e| e.end)
    }

    /// Whether `other` describes the same architecture (names, shapes, order).
    pub fn is_compatible_with(&self, other: &ParameterLayout) -> bool {
        self == other
    }

    /// Flatten a client model against this canonical layout.
    ///
    /// The model must list the same parameter names with the same shapes in
    /// the same order, otherwise [`AggregationError::LayoutMismatch`] is
    /// returned and nothing is copied.
    pub fn flatten<S: ParameterSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<FlatVector, AggregationError> {
        let params = source.named_parameters();
        if params.len() != self.entries.len() {
            return Err(AggregationError::LayoutMismatch {
                index: params.len().min(self.entries.len()),
                reason: format!(
                    "layout has {} parameters, model has {}",
                    self.entries.len(),
                    params.len()
                ),
            });
        }

        for (index, (entry, (name, tensor))) in self.entries.iter().zip(&params).enumerate() {
            if entry.name != *name {
                return Err(AggregationError::LayoutMismatch {
                    index,
                    reason: format!("expected parameter '{}', found '{}'", entry.name, name),
                });
            }
            if entry.shape.as_slice() != tensor.shape() {
                return Err(AggregationError::LayoutMismatch {
                    index,
                    reason: format!(
                        "parameter '{}' has shape {:?}, layout expects {:?}",
                        name,
                        tensor.shape(),
                        entry.shape
                    ),
                });
            }
        }

        let mut values = Vec::with_capacity(self.total_len());
        for (_, tensor) in &params {
            values.extend(tensor.iter().copied());
        }
        Ok(FlatVector::from(values))
    }

    /// Rebuild named tensors using the shapes recorded in this layout.
    pub fn recover(&self, flat: &FlatVector) -> Result<StateDict, AggregationError> {
        if flat.len() != self.total_len() {
            return Err(AggregationError::LengthMismatch {
                expected: self.total_len(),
                actual: flat.len(),
            });
        }

        let mut state = StateDict::new();
        for entry in &self.entries {
            let values = flat.as_slice()[entry.range()].to_vec();
            let tensor = ArrayD::from_shape_vec(IxDyn(&entry.shape), values).map_err(|_| {
                AggregationError::ShapeMismatch {
                    name: entry.name.clone(),
                    expected: entry.num_elements(),
                    actual: entry.shape.iter().product(),
                }
            })?;
            state.insert(entry.name.clone(), tensor);
        }
        Ok(state)
    }
}
