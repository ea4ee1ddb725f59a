//! Error types shared across the taxalpha domain model.

use thiserror::Error;

/// Errors raised by operations on the core domain types (tax lots,
/// positions, accounts, benchmarks, rebalancing events).
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invariant the domain model is supposed to uphold was violated,
    /// e.g. `position.quantity != Σ open_lots.remaining_quantity`.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A tax lot does not have enough remaining quantity to satisfy a sell.
    #[error("lot {lot_id} has {available} remaining, {requested} requested")]
    InsufficientLotQuantity {
        /// The tax lot that was short.
        lot_id: String,
        /// Quantity actually remaining on the lot.
        available: f64,
        /// Quantity the caller asked to sell.
        requested: f64,
    },

    /// Benchmark weights at an effective date did not sum to 1 within tolerance.
    #[error("benchmark {benchmark} weights at {date} sum to {sum}, expected 1.0 +/- {tolerance}")]
    BenchmarkWeightsUnbalanced {
        /// Benchmark name.
        benchmark: String,
        /// Effective date of the constituent snapshot.
        date: chrono::NaiveDate,
        /// Observed sum of weights.
        sum: f64,
        /// Allowed tolerance.
        tolerance: f64,
    },

    /// A price, quantity, or rate argument was outside its valid domain.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// Stringified offending value.
        value: String,
    },

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` alias for [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
