#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a lower bound is greater than the corresponding upper bound.
    #[error("invalid bounds: lower ({lower}) must be less than or equal to upper ({upper})")]
    InvalidBounds {
        /// The lower bound value.
        lower: f64,
        /// The upper bound value.
        upper: f64,
    },

    /// Returned when a parameter group addresses no physical quantities.
    #[error("parameter group {index} is empty")]
    EmptyGroup {
        /// The index of the offending group.
        index: usize,
    },

    /// Returned when a numeric setting is NaN or infinite.
    #[error("invalid setting '{name}': {value} is not a finite number")]
    NonFiniteSetting {
        /// The name of the offending setting.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Returned when a count-valued setting is zero.
    #[error("invalid setting '{name}': must be at least 1")]
    ZeroCount {
        /// The name of the offending setting.
        name: &'static str,
    },

    /// Returned when a coordinate or objective vector has the wrong length.
    #[error("dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch {
        /// The expected number of values.
        expected: usize,
        /// The actual number of values.
        got: usize,
    },

    /// Returned when applying physical settings fails at the device layer.
    #[error("actuation failed: {0}")]
    Actuation(String),

    /// Returned when taking a measurement fails at the device layer.
    #[error("measurement failed: {0}")]
    Measurement(String),

    /// Returned when persisting or reading a front snapshot fails.
    #[error("storage error: {0}")]
    Storage(String),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
