use thiserror::Error;

/// Construction errors. These abort construction and never yield a
/// partially valid container.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("'{name}' requires a value range (range_min and range_max)")]
    MissingRange { name: String },
    #[error("range of '{name}' is inverted: min {min} > max {max}")]
    InvertedRange { name: String, min: f64, max: f64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("name cannot be empty")]
    EmptyName,

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Non-fatal operation errors. An operation returning one of these produced
/// no result; the operands are unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    #[error("operation '{op}' is not possible for boolean series '{name}'")]
    NotPossibleForBoolean { op: &'static str, name: String },
    #[error("operation '{op}' is not possible for percentage series '{name}'")]
    NotPossibleForPercentage { op: &'static str, name: String },

    #[error("division by 0 is not defined for '{name}'")]
    DivisionByZero { name: String },
    #[error("operand {operand} is not supported for '{op}' on '{name}'")]
    UnsupportedOperand {
        op: &'static str,
        operand: &'static str,
        name: String,
    },
    #[error("unsupported configuration for '{name}': {reason}")]
    UnsupportedConfiguration { name: String, reason: String },

    #[error("default value {value} does not match the {domain} domain of '{name}'")]
    IncompatibleDefault {
        name: String,
        value: f64,
        domain: &'static str,
    },
    #[error("default value {value} of '{name}' is outside [{min}, {max}]")]
    DefaultOutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("default value of boolean series '{name}' must be 0 or 1, got {value}")]
    InvalidBinaryDefault { name: String, value: f64 },

    #[error("interval bound {bound} of '{name}' is outside the series span")]
    IntervalOutOfBounds { name: String, bound: f64 },
    #[error("'{name}' holds no values")]
    EmptySource { name: String },

    #[error("unit {found} of '{name}' does not match {expected}")]
    UnitMismatch {
        name: String,
        expected: String,
        found: String,
    },
    #[error("provided signals do not share a common timestamp basis with '{name}'")]
    NoCommonTimestamps { name: String },
}

/// Unit label parsing and composition errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("unit exponent must be finite, got {exponent}")]
    NonFiniteExponent { exponent: f64 },
    #[error("cannot parse unit label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },
}

/// Malformed pack payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("packed {kind} needs at least {expected} values, got {actual}")]
    TooShort {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("packed histogram has an odd number of pair values ({actual})")]
    OddPairCount { actual: usize },
    #[error("timestamp channel holds {timestamps} entries for {values} values")]
    TimestampMismatch { timestamps: usize, values: usize },
}

/// Chart rendering errors.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("nothing to draw: {0}")]
    EmptyChart(String),
    #[error("chart serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("chart backend error: {0}")]
    Render(String),
    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
