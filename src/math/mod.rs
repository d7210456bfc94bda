//! Numeric primitives shared by the aggregators and diagnostics.
//!
//! - [`norms`] - L2 norms and distances
//! - [`summation`] - order-independent `f64` accumulation

pub mod norms;
pub mod summation;

pub use norms::{l2_distance, l2_norm, l2_norm_sq};
pub use summation::ordered_sum;
