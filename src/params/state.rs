//! Ordered parameter collections.
//!
//! [`ParameterSource`] is the seam between the codec and whatever holds a
//! model's tensors. The codec only needs a stable, ordered traversal of
//! `(name, tensor)` pairs; it never looks inside the model otherwise.

use ndarray::{ArrayD, ArrayViewD};
use serde::{Deserialize, Serialize};

/// Anything that can list its parameters in a fixed, reproducible order.
///
/// Two structurally identical models must yield the same names and shapes
/// in the same order, otherwise their flat vectors are not comparable
/// coordinate by coordinate.
pub trait ParameterSource {
    /// Parameters in declaration order.
    fn named_parameters(&self) -> Vec<(&str, ArrayViewD<'_, f32>)>;
}

/// Insertion-ordered mapping from parameter name to tensor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    entries: Vec<(String, ArrayD<f32>)>,
}

impl StateDict {
    /// Create an empty state dict.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a tensor under `name`.
    ///
    /// Re-inserting an existing name replaces the tensor in place and keeps
    /// its original position; returns the previous tensor in that case.
    pub fn insert(&mut self, name: impl Into<String>, tensor: ArrayD<f32>) -> Option<ArrayD<f32>> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, tensor)),
            None => {
                self.entries.push((name, tensor));
                None
            }
        }
    }

    /// Tensor stored under `name`.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, tensor)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayD<f32>)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Total number of scalar elements across all tensors.
    pub fn num_elements(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.len()).sum()
    }

    /// Consume into the ordered tensors, dropping names.
    pub fn into_tensors(self) -> Vec<ArrayD<f32>> {
        self.entries.into_iter().map(|(_, t)| t).collect()
    }
}

impl<N: Into<String>> FromIterator<(N, ArrayD<f32>)> for StateDict {
    fn from_iter<I: IntoIterator<Item = (N, ArrayD<f32>)>>(iter: I) -> Self {
        let mut state = StateDict::new();
        for (name, tensor) in iter {
            state.insert(name, tensor);
        }
        state
    }
}

impl ParameterSource for StateDict {
    fn named_parameters(&self) -> Vec<(&str, ArrayViewD<'_, f32>)> {
        self.entries
            .iter()
            .map(|(n, t)| (n.as_str(), t.view()))
            .collect()
    }
}

impl ParameterSource for [(String, ArrayD<f32>)] {
    fn named_parameters(&self) -> Vec<(&str, ArrayViewD<'_, f32>)> {
        self.iter().map(|(n, t)| (n.as_str(), t.view())).collect()
    }
}

impl ParameterSource for Vec<(String, ArrayD<f32>)> {
    fn named_parameters(&self) -> Vec<(&str, ArrayViewD<'_, f32>)> {
        self.as_slice().named_parameters()
    }
}
