//! Errors produced while building the risk matrices or solving the QP.

use thiserror::Error;

/// Errors arising in the optimization pipeline.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The security universe passed to the optimizer was empty.
    #[error("optimizer called with an empty security universe")]
    EmptyUniverse,

    /// The risk model does not cover a security in the optimization universe.
    #[error("no factor exposures available for {security_id}")]
    MissingExposures {
        /// Security missing from the exposure matrix.
        security_id: taxalpha_core::SecurityId,
    },

    /// The factor covariance matrix did not include every factor the
    /// exposure matrix references.
    #[error("factor covariance matrix is missing factor {factor}")]
    MissingFactorCovariance {
        /// Stable key of the missing factor.
        factor: String,
    },

    /// The projected-gradient solve failed to converge within the
    /// iteration budget.
    #[error("QP solve did not converge after {iterations} iterations")]
    DidNotConverge {
        /// Iterations actually run.
        iterations: usize,
    },

    /// No current price was supplied for a security that needs to be traded.
    #[error("no current price available for {security_id}")]
    MissingPrice {
        /// Security missing a price.
        security_id: taxalpha_core::SecurityId,
    },

    /// Propagated from `taxalpha-core`.
    #[error(transparent)]
    Core(#[from] taxalpha_core::CoreError),

    /// Propagated from `taxalpha-harvest`'s lot selection.
    #[error(transparent)]
    Harvest(#[from] taxalpha_harvest::HarvestError),
}

/// Convenience alias for `Result<T, OptimizeError>`.
pub type Result<T> = std::result::Result<T, OptimizeError>;
