//! Error types for parameter flattening and aggregation

use thiserror::Error;

/// All structural errors raised by the codec and the aggregators.
///
/// Every variant is fatal to the call that produced it; nothing is
/// partially aggregated or silently dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// The parameter collection handed to the codec was empty
    #[error("Model has no parameters to flatten")]
    EmptyModel,

    /// A parameter has zero elements, or its element count overflows `usize`
    #[error("Parameter '{name}' has invalid shape {shape:?}")]
    Shape {
        /// Parameter name
        name: String,
        /// Offending shape
        shape: Vec<usize>,
    },

    /// Flat vector length does not match the layout's total span
    #[error("Flat vector length mismatch: layout spans {expected}, got {actual}")]
    LengthMismatch {
        /// Total span of the layout
        expected: usize,
        /// Length of the supplied vector
        actual: usize,
    },

    /// A layout slice does not fit the reference parameter's shape
    #[error("Shape mismatch for '{name}': slice holds {expected} elements, reference shape needs {actual}")]
    ShapeMismatch {
        /// Parameter name (from the layout)
        name: String,
        /// Element count of the layout slice
        expected: usize,
        /// Element count required by the reference shape
        actual: usize,
    },

    /// A client model does not follow the canonical layout
    #[error("Layout mismatch at parameter {index}: {reason}")]
    LayoutMismatch {
        /// Position in the canonical traversal
        index: usize,
        /// What diverged
        reason: String,
    },

    /// No updates were provided for aggregation
    #[error("Empty updates provided")]
    EmptyUpdates,

    /// A client vector has a different length than the first one
    #[error("Dimension mismatch for client {client}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Index of the offending client in the update list
        client: usize,
        /// Length of the first update
        expected: usize,
        /// Length of the offending update
        actual: usize,
    },

    /// Weights sum to zero
    #[error("Total client weight is zero")]
    ZeroWeight,

    /// A weight is negative or not finite
    #[error("Invalid weight {weight} for client {client}")]
    InvalidWeight {
        /// Index of the offending client
        client: usize,
        /// Supplied weight
        weight: f32,
    },

    /// Weight list length differs from the number of updates
    #[error("Weight count mismatch: {updates} updates, {weights} weights")]
    WeightCountMismatch {
        /// Number of updates
        updates: usize,
        /// Number of weights
        weights: usize,
    },

    /// Trim count leaves no values to average
    #[error("Invalid trim: trimming {trim} from each end of {clients} clients leaves nothing")]
    InvalidTrim {
        /// Values trimmed from each end
        trim: usize,
        /// Number of contributing clients
        clients: usize,
    },

    /// Trim fraction is outside valid range
    #[error("Invalid trim fraction: {0} (must be 0.0-0.5)")]
    InvalidTrimFraction(f32),

    /// Scale factor is not finite
    #[error("Invalid scale factor: {0}")]
    InvalidScale(f32),

    /// Policy identifier is not registered
    #[error("Unknown aggregation policy '{0}'")]
    UnknownPolicy(String),

    /// Aggregation under a named policy failed
    #[error("{policy} aggregation failed: {source}")]
    Policy {
        /// Policy identifier
        policy: &'static str,
        /// Underlying structural error
        #[source]
        source: Box<AggregationError>,
    },
}

impl AggregationError {
    /// The innermost error, with any policy context stripped.
    pub fn root_cause(&self) -> &AggregationError {
        match self {
            AggregationError::Policy { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
