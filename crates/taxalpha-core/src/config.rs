//! Static, per-process configuration.
//!
//! Loaded once at startup (by the CLI binary) into a [`Config`] value and
//! carried inside [`crate::context::Context`] from then on; nothing in the
//! library crates reads environment variables or files directly.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Feature flags gating optional stages of the risk model and optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Orthogonalize non-Size style factors against Size (after imputation).
    pub orthogonalize: bool,
    /// Smooth specific variance via EWMA + industry-median shrinkage.
    pub smooth_specific_risk: bool,
    /// Blend short- and long-window factor covariance estimates.
    pub blend_short_long_cov: bool,
    /// Apply Ledoit-Wolf-style shrinkage to the factor covariance.
    pub shrink_cov: bool,
    /// Project the factor covariance to the nearest PSD matrix.
    pub enforce_psd: bool,
    /// Enforce point-in-time filtering on fundamentals-derived factors.
    pub enforce_pit: bool,
    /// Compute 6- and 3-month momentum variants alongside the canonical 12-1.
    pub multi_horizon_momentum: bool,
    /// Compute a 3-year sales CAGR growth variant alongside the canonical YoY.
    pub multi_horizon_growth: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            orthogonalize: false,
            smooth_specific_risk: true,
            blend_short_long_cov: true,
            shrink_cov: true,
            enforce_psd: true,
            enforce_pit: true,
            multi_horizon_momentum: false,
            multi_horizon_growth: false,
        }
    }
}

/// Static configuration for the pipeline, enumerated in full rather than
/// scattered across process-wide constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wash-sale window on each side of a sale, in days.
    pub wash_sale_window_days: i64,
    /// Minimum holding period, in days, to qualify for the long-term rate.
    pub long_term_holding_days: i64,
    /// Minimum `|unrealized_loss|` for a lot to be considered harvestable.
    pub min_tax_loss_threshold: f64,
    /// Tracking-error level (norm-of-active-weights proxy) that triggers a rebalance.
    pub tracking_error_threshold: f64,
    /// Maximum `Σ(buys + sells)` per rebalance.
    pub turnover_limit: f64,
    /// Transaction-cost weight in the optimizer's objective.
    pub lambda_transaction: f64,
    /// Tax-benefit weight in the optimizer's objective.
    pub lambda_tax: f64,
    /// Embedded-gain penalty weight in the optimizer's objective.
    pub lambda_gain: f64,
    /// Assumed per-dollar transaction cost rate.
    pub transaction_cost_rate: f64,
    /// Months of factor-return history used to estimate factor covariance.
    pub factor_cov_window_months: usize,
    /// Short window (months) for covariance blending.
    pub factor_cov_short_window_months: usize,
    /// Lookback, in months, for the currency-sensitivity regression.
    pub currency_beta_lookback_months: usize,
    /// Minimum monthly observations required for the currency-sensitivity regression.
    pub currency_beta_min_obs: usize,
    /// Lookback, in months, for the beta regression.
    pub beta_lookback_months: usize,
    /// Minimum monthly observations required for the beta regression.
    pub beta_min_obs: usize,
    /// Fraction of imputed exposures for a factor above which a warning is raised.
    pub imputation_warning_threshold: f64,
    /// Days since the last successful rebalance before one is scheduled unconditionally.
    pub scheduled_rebalance_days: i64,
    /// EWMA decay applied when smoothing specific variance.
    pub specific_risk_ewma_lambda: f64,
    /// Shrinkage weight toward the industry median when smoothing specific variance.
    pub specific_risk_shrinkage_weight: f64,
    /// Feature flags.
    pub flags: FeatureFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wash_sale_window_days: 30,
            long_term_holding_days: 365,
            min_tax_loss_threshold: 500.0,
            tracking_error_threshold: 0.02,
            turnover_limit: 0.20,
            lambda_transaction: 1.0,
            lambda_tax: 1.0,
            lambda_gain: 0.5,
            transaction_cost_rate: 0.0010,
            factor_cov_window_months: 60,
            factor_cov_short_window_months: 12,
            currency_beta_lookback_months: 60,
            currency_beta_min_obs: 24,
            beta_lookback_months: 60,
            beta_min_obs: 36,
            imputation_warning_threshold: 0.3,
            scheduled_rebalance_days: 30,
            specific_risk_ewma_lambda: 0.94,
            specific_risk_shrinkage_weight: 0.3,
            flags: FeatureFlags::default(),
        }
    }
}

impl Config {
    /// Loads configuration from an optional TOML file, then applies any
    /// environment-variable overrides, then validates the result.
    ///
    /// A local `.env` file (if present) is loaded first via `dotenvy`, the
    /// same as this lineage's CLI tooling already does.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the file cannot be read, cannot be
    /// parsed as TOML, or parses to an invalid configuration (see
    /// [`Config::validate`]).
    pub fn load(toml_path: Option<&std::path::Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match toml_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| CoreError::Config(format!("reading {}: {e}", path.display())))?;
                toml::from_str(&text)
                    .map_err(|e| CoreError::Config(format!("parsing {}: {e}", path.display())))?
            }
            None => Self::default(),
        };

        if let Ok(v) = std::env::var("TAXALPHA_TURNOVER_LIMIT") {
            config.turnover_limit = v
                .parse()
                .map_err(|e| CoreError::Config(format!("TAXALPHA_TURNOVER_LIMIT: {e}")))?;
        }
        if let Ok(v) = std::env::var("TAXALPHA_TRACKING_ERROR_THRESHOLD") {
            config.tracking_error_threshold = v
                .parse()
                .map_err(|e| CoreError::Config(format!("TAXALPHA_TRACKING_ERROR_THRESHOLD: {e}")))?;
        }
        if let Ok(v) = std::env::var("TAXALPHA_MIN_TAX_LOSS_THRESHOLD") {
            config.min_tax_loss_threshold = v
                .parse()
                .map_err(|e| CoreError::Config(format!("TAXALPHA_MIN_TAX_LOSS_THRESHOLD: {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that configured values fall in their valid domains.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] describing the first invalid field found.
    pub fn validate(&self) -> Result<()> {
        if self.wash_sale_window_days <= 0 {
            return Err(CoreError::Config("wash_sale_window_days must be positive".into()));
        }
        if self.turnover_limit <= 0.0 || self.turnover_limit > 2.0 {
            return Err(CoreError::Config("turnover_limit out of range (0, 2]".into()));
        }
        if self.imputation_warning_threshold < 0.0 || self.imputation_warning_threshold > 1.0 {
            return Err(CoreError::Config(
                "imputation_warning_threshold must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_nonpositive_wash_sale_window() {
        let mut config = Config::default();
        config.wash_sale_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let text = r#"
            turnover_limit = 0.35
            min_tax_loss_threshold = 250.0

            [flags]
            orthogonalize = true
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.turnover_limit, 0.35);
        assert_eq!(config.min_tax_loss_threshold, 250.0);
        assert!(config.flags.orthogonalize);
        assert!(config.flags.smooth_specific_risk);
    }
}
