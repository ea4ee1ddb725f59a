//! Errors produced while building a risk model.

use thiserror::Error;

/// Errors arising anywhere in the risk model pipeline.
#[derive(Debug, Error)]
pub enum RiskModelError {
    /// A style factor could not be computed for the requested month-end
    /// because the panel held no usable observations.
    #[error("no observations for factor {factor} at {month_end}")]
    NoObservations {
        /// Name of the style factor.
        factor: String,
        /// Month-end requested.
        month_end: chrono::NaiveDate,
    },

    /// The cross-sectional regression's design matrix was empty or had
    /// fewer rows than columns.
    #[error("regression design matrix underdetermined: {n_stocks} stocks, {n_factors} factors")]
    Underdetermined {
        /// Number of stocks (rows).
        n_stocks: usize,
        /// Number of factors (columns).
        n_factors: usize,
    },

    /// A classification level (sector/industry/sub_industry/country) had
    /// a security with no label, which would break the one-hot row-sum
    /// invariant.
    #[error("security {security_id} missing classification label for level {level}")]
    MissingClassification {
        /// The affected security.
        security_id: taxalpha_core::SecurityId,
        /// The classification level.
        level: String,
    },

    /// Linear algebra failed (e.g. an eigendecomposition did not converge).
    #[error("linear algebra failure: {0}")]
    LinearAlgebra(String),

    /// More than `imputation_warning_threshold` of a factor's exposures in
    /// a cross-section had to be imputed rather than observed directly.
    /// Non-fatal: logged as a warning alongside the persisted (imputed)
    /// data, never returned as a hard failure from `build_cross_section`.
    #[error("factor {factor} at {month_end}: imputed fraction {rate:.3} exceeds threshold {threshold:.3}")]
    ImputationHigh {
        /// Name of the style factor.
        factor: String,
        /// Month-end the exposures were computed for.
        month_end: chrono::NaiveDate,
        /// Fraction of exposures imputed, in `[0, 1]`.
        rate: f64,
        /// Configured warning threshold, in `[0, 1]`.
        threshold: f64,
    },

    /// Propagated from `taxalpha-core`.
    #[error(transparent)]
    Core(#[from] taxalpha_core::CoreError),
}

/// Convenience alias for `Result<T, RiskModelError>`.
pub type Result<T> = std::result::Result<T, RiskModelError>;
