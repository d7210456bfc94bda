//! Flat parameter vector.

use std::ops::Index;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// One scalar per model parameter element, concatenated in layout order.
///
/// Treated as a value: aggregators read it and allocate a new vector for
/// their output, they never write into an input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatVector(Vec<f32>);

impl FlatVector {
    /// Vector of `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector holds no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    /// Borrow the elements as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Iterate over elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.0.iter()
    }

    /// Borrow as a 1-D ndarray view.
    pub fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(self.0.as_slice())
    }

    /// Consume into the backing `Vec`.
    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    /// Consume into an owned 1-D ndarray.
    pub fn into_array(self) -> Array1<f32> {
        Array1::from_vec(self.0)
    }
}

impl From<Vec<f32>> for FlatVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl From<&[f32]> for FlatVector {
    fn from(values: &[f32]) -> Self {
        Self(values.to_vec())
    }
}

impl From<Array1<f32>> for FlatVector {
    fn from(values: Array1<f32>) -> Self {
        // Logical order, whatever the memory layout of the array.
        Self(values.iter().copied().collect())
    }
}

impl FromIterator<f32> for FlatVector {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl AsRef<[f32]> for FlatVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl Index<usize> for FlatVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}
