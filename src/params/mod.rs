//! Parameter codec: named tensors to one flat vector and back.
//!
//! - [`flatten()`] walks a [`ParameterSource`] in declaration order and
//!   concatenates every tensor, returning the vector and its [`ParameterLayout`]
//! - [`recover()`] slices a vector by layout and reshapes against a live
//!   reference model
//! - [`ParameterLayout::flatten`] / [`ParameterLayout::recover`] do the same
//!   against a canonical layout derived once, so every client vector is
//!   checked against one architecture instead of re-deriving it per model

pub mod flatten;
pub mod layout;
pub mod recover;
pub mod state;
pub mod vector;

pub use flatten::flatten;
pub use layout::{LayoutEntry, ParameterLayout};
pub use recover::{recover, recover_state};
pub use state::{ParameterSource, StateDict};
pub use vector::FlatVector;
