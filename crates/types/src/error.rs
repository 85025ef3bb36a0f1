//! Error types for the SQL type system
//!
//! Every kernel function either returns a value or fails outright; there is
//! no partial success within a single conversion or comparison. All
//! operations are pure and deterministic, so retrying without changing input
//! is never meaningful.

use silica_value::LobId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Comparison or conversion between incomparable comparison groups, or a
    /// runtime value whose representation does not match the expected kind.
    #[error("incompatible types in operation: {left} and {right}")]
    IncompatibleTypes { left: String, right: String },

    /// Non-trailing data would be lost on implicit conversion.
    #[error("data exceeds limits of {type_name}")]
    DataTruncation { type_name: String },

    /// Character flavor of [`Error::DataTruncation`].
    #[error("string data, right truncation for {type_name}")]
    StringDataRightTruncation { type_name: String },

    /// Value exceeds the declared or intrinsic numeric range of the target.
    #[error("numeric value out of range for {type_name}")]
    NumericOverflow { type_name: String },

    /// Interval magnitude exceeds the limit implied by the declared
    /// leading-field precision.
    #[error("interval field overflow for {type_name}")]
    IntervalOutOfRange { type_name: String },

    #[error("array cardinality {cardinality} exceeds maximum {max}")]
    CardinalityViolation { cardinality: usize, max: usize },

    #[error("division by zero")]
    DivisionByZero,

    /// Requested datetime field is not meaningful for the type.
    #[error("cannot extract {field} from {type_name}")]
    InvalidExtractField { field: String, type_name: String },

    /// Scanner / literal parse failure.
    #[error("invalid {expected} literal: '{found}'")]
    InvalidFormat { expected: String, found: String },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("large object not found: {0}")]
    LobNotFound(LobId),

    /// Truly unreachable states; never a policy outcome.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Recorded instead of a failure when an explicit cast truncates data the
/// implicit conversion path would reject.
#[derive(Debug, Clone, PartialEq)]
pub struct CastWarning {
    pub type_name: String,
    pub reason: String,
}

impl CastWarning {
    pub fn truncation(type_name: impl Into<String>) -> Self {
        CastWarning {
            type_name: type_name.into(),
            reason: "data truncated on cast".into(),
        }
    }
}
