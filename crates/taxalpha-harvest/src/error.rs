//! Errors produced while searching for and scoring harvest opportunities.

use thiserror::Error;

/// Errors arising in the harvesting pipeline.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A lot selector was asked for more quantity than the available lots
    /// (in aggregate) can supply.
    #[error("requested {requested} shares but only {available} available across open lots for {security_id}")]
    InsufficientQuantity {
        /// Security the lots belong to.
        security_id: taxalpha_core::SecurityId,
        /// Quantity requested.
        requested: f64,
        /// Quantity actually available.
        available: f64,
    },

    /// Propagated from `taxalpha-core`.
    #[error(transparent)]
    Core(#[from] taxalpha_core::CoreError),
}

/// Convenience alias for `Result<T, HarvestError>`.
pub type Result<T> = std::result::Result<T, HarvestError>;
