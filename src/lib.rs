//! # fl-aggregation: parameter aggregation for federated learning
//!
//! Combines the model parameters trained independently by many clients into
//! one global model.
//!
//! ## Parameter codec
//!
//! - [`flatten()`] - Named tensors to one flat vector plus a [`ParameterLayout`]
//! - [`recover()`] - Flat vector back to tensors shaped like a reference model
//!
//! ## Aggregation Methods
//!
//! - [`fedavg()`] - Weighted FedAvg baseline (no Byzantine tolerance)
//! - [`median()`] - Coordinate-wise median (< 50% Byzantine tolerance)
//! - [`trimmed_mean()`] - Coordinate-wise trimmed mean
//! - [`weighted_sum()`] - Coordinate-wise (scaled) sum
//!
//! ## High-Level API
//!
//! Select a policy with [`AggregationPolicy`] (or from an
//! [`AggregationConfig`]) and aggregate a round of [`ClientUpdate`]s, or use
//! [`FederatedAggregator`] to also keep an audit trail of rounds.
//!
//! ```rust
//! use fl_aggregation::{flatten, recover, AggregationPolicy, ClientUpdate, StateDict};
//! use ndarray::array;
//!
//! let global: StateDict = vec![
//!     ("fc.weight", array![[0.0f32, 0.0]].into_dyn()),
//!     ("fc.bias", array![0.0f32].into_dyn()),
//! ]
//! .into_iter()
//! .collect();
//! let (_, layout) = flatten(&global).unwrap();
//!
//! let updates = vec![
//!     ClientUpdate::new("a", vec![1.0, 2.0, 3.0]),
//!     ClientUpdate::new("b", vec![3.0, 4.0, 5.0]),
//!     ClientUpdate::new("c", vec![500.0, 6.0, 4.0]),
//! ];
//! let result = AggregationPolicy::Median.aggregate(&updates).unwrap();
//!
//! let tensors = recover(&result.params, &layout, &global).unwrap();
//! assert_eq!(tensors[0], array![[3.0f32, 4.0]].into_dyn());
//! assert_eq!(tensors[1], array![4.0f32].into_dyn());
//! ```

#![deny(missing_docs)]

pub mod aggregators;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod math;
pub mod params;

// Re-exports
pub use aggregators::fedavg;
pub use aggregators::median;
pub use aggregators::trimmed_mean;
pub use aggregators::weighted_sum;
pub use aggregators::{
    AggregateResult, AggregationPolicy, ClientUpdate, FederatedAggregator, TrimSpec,
};
pub use config::AggregationConfig;
pub use error::AggregationError;
pub use params::{flatten, recover, recover_state};
pub use params::{FlatVector, LayoutEntry, ParameterLayout, ParameterSource, StateDict};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Python bindings via PyO3
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1, PyReadonlyArrayDyn};
    use pyo3::prelude::*;

    use crate::{AggregationConfig, AggregationError, ClientUpdate, FlatVector, StateDict};

    fn agg_err(e: AggregationError) -> PyErr {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
    }

    /// Aggregate a list of 1-D float32 arrays under the named policy.
    #[pyfunction]
    #[pyo3(signature = (policy, updates, weights=None, trim_fraction=None, trim_count=None, scale=None))]
    fn aggregate<'py>(
        py: Python<'py>,
        policy: String,
        updates: Vec<PyReadonlyArray1<'py, f32>>,
        weights: Option<Vec<f32>>,
        trim_fraction: Option<f32>,
        trim_count: Option<usize>,
        scale: Option<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let config = AggregationConfig {
            policy,
            trim_fraction,
            trim_count,
            scale,
        };
        let policy = config.policy().map_err(agg_err)?;

        if let Some(w) = &weights {
            if w.len() != updates.len() {
                return Err(agg_err(AggregationError::WeightCountMismatch {
                    updates: updates.len(),
                    weights: w.len(),
                }));
            }
        }

        let client_updates: Vec<ClientUpdate> = updates
            .iter()
            .enumerate()
            .map(|(i, arr)| {
                let update = ClientUpdate::new(
                    format!("client_{}", i),
                    FlatVector::from(arr.as_array().to_owned()),
                );
                match weights.as_ref().and_then(|w| w.get(i)) {
                    Some(&w) => update.with_weight(w),
                    None => update,
                }
            })
            .collect();

        let result = policy.aggregate(&client_updates).map_err(agg_err)?;
        Ok(result.params.into_array().into_pyarray(py))
    }

    /// Flatten an ordered list of float32 tensors; returns the vector and
    /// the `(start, end)` offsets of each tensor.
    #[pyfunction]
    fn flatten<'py>(
        py: Python<'py>,
        tensors: Vec<PyReadonlyArrayDyn<'py, f32>>,
    ) -> PyResult<(&'py PyArray1<f32>, Vec<(usize, usize)>)> {
        let state: StateDict = tensors
            .iter()
            .enumerate()
            .map(|(i, t)| (i.to_string(), t.as_array().to_owned()))
            .collect();
        let (flat, layout) = crate::flatten(&state).map_err(agg_err)?;
        let offsets = layout.entries().iter().map(|e| (e.start, e.end)).collect();
        Ok((flat.into_array().into_pyarray(py), offsets))
    }

    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(aggregate, m)?)?;
        m.add_function(wrap_pyfunction!(flatten, m)?)?;
        Ok(())
    }
}
