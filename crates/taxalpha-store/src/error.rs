//! Errors produced by the persistence layer.

use thiserror::Error;

/// Errors arising from [`crate::traits::AnalyticsStore`] and
/// [`crate::traits::AccountStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the requested key.
    #[error("no {kind} found for {key}")]
    NotFound {
        /// What kind of record was being looked up, e.g. `"account"`.
        kind: &'static str,
        /// The key that was looked up, rendered for display.
        key: String,
    },

    /// A filesystem operation failed while exporting data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A Polars DataFrame operation failed while building or writing an export.
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    /// JSON (de)serialization of an export manifest failed.
    #[error("manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Propagated from `taxalpha-core`.
    #[error(transparent)]
    Core(#[from] taxalpha_core::CoreError),
}

/// Convenience alias for `Result<T, StoreError>`.
pub type Result<T> = std::result::Result<T, StoreError>;
