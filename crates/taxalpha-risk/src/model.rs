//! `RiskModelBuilder`: orchestrates the per-month cross-sectional pipeline
//! (style factors → winsorization/standardization → imputation →
//! orthogonalization → classification → regression → specific risk) and
//! the separate, time-series-only factor covariance estimation step.

use std::collections::HashMap;

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use taxalpha_core::factor::style_names;
use taxalpha_core::{Config, Exposure, Factor, FactorCovariance, FactorReturn, RegressionDiagnostics, SecurityId, SpecificVariance};

use crate::classification::classify;
use crate::covariance::{blend_short_long, project_psd, sample_covariance, shrink_to_diagonal};
use crate::error::{Result, RiskModelError};
use crate::imputation::{impute_by_sector_median, imputation_rate};
use crate::orthogonalize::orthogonalize_against_size;
use crate::panel::RiskPanel;
use crate::regression::run_wls;
use crate::specific_risk;
use crate::style::beta::Beta;
use crate::style::book_to_price::BookToPrice;
use crate::style::currency_sensitivity::CurrencySensitivity;
use crate::style::dividend_yield::DividendYield;
use crate::style::earnings_variability::EarningsVariability;
use crate::style::earnings_yield::EarningsYield;
use crate::style::growth::Growth;
use crate::style::leverage::Leverage;
use crate::style::momentum::Momentum;
use crate::style::size::Size;
use crate::style::{winsorize_and_standardize, StyleFactor, DEFAULT_WINSORIZE_PCT};

/// Output of one month-end's cross-sectional pipeline.
#[derive(Debug, Clone)]
pub struct CrossSectionOutput {
    /// Every exposure row computed for this month: style, industry, and
    /// country factors.
    pub exposures: Vec<Exposure>,
    /// One realized return per factor, in the regression's column order.
    pub factor_returns: Vec<FactorReturn>,
    /// Regression diagnostics for this month.
    pub diagnostics: RegressionDiagnostics,
    /// Specific variance rows for every security included in the regression.
    pub specific_variances: Vec<SpecificVariance>,
}

/// Orchestrates risk model estimation over a [`RiskPanel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskModelBuilder;

impl RiskModelBuilder {
    /// Builds every style factor enabled by `config.flags`, in the fixed
    /// order the rest of the pipeline relies on for a deterministic
    /// exposure matrix column ordering.
    fn style_factors(config: &Config) -> Vec<Box<dyn StyleFactor>> {
        let mut factors: Vec<Box<dyn StyleFactor>> = vec![
            Box::new(Size),
            Box::new(Beta::new(config.beta_lookback_months, config.beta_min_obs)),
            Box::new(Momentum::canonical()),
            Box::new(EarningsYield),
            Box::new(BookToPrice),
            Box::new(Growth::canonical()),
            Box::new(EarningsVariability),
            Box::new(Leverage),
            Box::new(DividendYield),
            Box::new(CurrencySensitivity::new(
                config.currency_beta_lookback_months,
                config.currency_beta_min_obs,
            )),
        ];
        if config.flags.multi_horizon_momentum {
            factors.push(Box::new(Momentum::six_month()));
            factors.push(Box::new(Momentum::three_month()));
        }
        if config.flags.multi_horizon_growth {
            factors.push(Box::new(Growth::three_year()));
        }
        factors
    }

    /// Runs the full cross-sectional pipeline for one month-end.
    ///
    /// `prior_specific_ewma` carries forward last month's EWMA specific
    /// variance per security (empty for the first month in a series).
    ///
    /// # Errors
    ///
    /// Returns an error if the regression's design matrix is underdetermined
    /// or a decomposition fails; see [`crate::error::RiskModelError`].
    pub fn build_cross_section(
        &self,
        panel: &RiskPanel,
        config: &Config,
        month_end: NaiveDate,
        computed_at: NaiveDate,
        prior_specific_ewma: &HashMap<SecurityId, f64>,
    ) -> Result<CrossSectionOutput> {
        let cross_section = panel.cross_section(month_end);
        let universe: Vec<(SecurityId, &str)> =
            cross_section.iter().map(|r| (r.security_id, r.sector.as_str())).collect();

        let mut style_columns: Vec<(String, Vec<(SecurityId, f64)>)> = Vec::new();
        let mut style_imputed: HashMap<(String, SecurityId), bool> = HashMap::new();
        let mut size_standardized: Vec<(SecurityId, f64)> = Vec::new();

        for factor in Self::style_factors(config) {
            let raw = factor.raw_signal(panel, month_end);
            let (observed_ids, observed_values): (Vec<SecurityId>, Vec<f64>) = raw.into_iter().unzip();
            let standardized_values = winsorize_and_standardize(observed_values, DEFAULT_WINSORIZE_PCT);
            let standardized_observed: Vec<(SecurityId, f64)> =
                observed_ids.into_iter().zip(standardized_values).collect();

            let imputed = impute_by_sector_median(&standardized_observed, &universe);
            let rate = imputation_rate(&imputed);
            if rate > config.imputation_warning_threshold {
                tracing::warn!(
                    "{}",
                    RiskModelError::ImputationHigh {
                        factor: factor.name().to_string(),
                        month_end,
                        rate,
                        threshold: config.imputation_warning_threshold,
                    }
                );
            }

            let name = factor.name().to_string();
            for value in &imputed {
                style_imputed.insert((name.clone(), value.security_id), value.imputed);
            }
            let column: Vec<(SecurityId, f64)> =
                imputed.iter().map(|v| (v.security_id, v.value)).collect();

            if factor.name() == style_names::SIZE {
                size_standardized = column.clone();
            }
            style_columns.push((name, column));
        }

        if config.flags.orthogonalize {
            for (name, column) in &mut style_columns {
                if name.as_str() != style_names::SIZE {
                    *column = orthogonalize_against_size(column, &size_standardized);
                }
            }
        }

        let classification_exposures = classify(panel, month_end, computed_at);

        let mut exposures: Vec<Exposure> = Vec::new();
        for (name, column) in &style_columns {
            for (security_id, value) in column {
                let imputed = style_imputed
                    .get(&(name.clone(), *security_id))
                    .copied()
                    .unwrap_or(false);
                exposures.push(Exposure {
                    security_id: *security_id,
                    factor: Factor::Style(name.clone()),
                    month_end,
                    value: *value,
                    flags: if imputed { "imputed:sector_median".to_string() } else { String::new() },
                    computed_at,
                });
            }
        }
        exposures.extend(classification_exposures.clone());

        // Assemble the regression design matrix: securities in a fixed
        // order, columns = style factors then industry/country one-hots.
        let mut security_order: Vec<SecurityId> = cross_section.iter().map(|r| r.security_id).collect();
        security_order.sort_unstable_by_key(|id| id.to_string());

        let mut factor_keys: Vec<String> = style_columns.iter().map(|(name, _)| name.clone()).collect();
        let mut industry_country_keys: Vec<String> = classification_exposures
            .iter()
            .map(|e| e.factor.key())
            .collect();
        industry_country_keys.sort_unstable();
        industry_country_keys.dedup();
        factor_keys.extend(industry_country_keys.iter().cloned());

        let mut value_lookup: HashMap<(SecurityId, String), f64> = HashMap::new();
        for exposure in &exposures {
            value_lookup.insert((exposure.security_id, exposure.factor.key()), exposure.value);
        }

        let n_stocks = security_order.len();
        let n_factors = factor_keys.len();
        let x = DMatrix::from_fn(n_stocks, n_factors, |i, j| {
            value_lookup
                .get(&(security_order[i], factor_keys[j].clone()))
                .copied()
                .unwrap_or(0.0)
        });

        let weights = DVector::from_fn(n_stocks, |i, _| {
            cross_section
                .iter()
                .find(|r| r.security_id == security_order[i])
                .map_or(0.0, |r| r.market_cap.max(0.0).sqrt())
        });
        let y = DVector::from_fn(n_stocks, |i, _| {
            cross_section
                .iter()
                .find(|r| r.security_id == security_order[i])
                .map_or(0.0, |r| r.monthly_return)
        });

        let regression_output = run_wls(&x, &weights, &y, month_end)?;

        let factor_returns: Vec<FactorReturn> = factor_keys
            .iter()
            .enumerate()
            .map(|(j, key)| FactorReturn {
                factor: factor_for_key(key),
                month_end,
                factor_return: regression_output.factor_returns[j],
            })
            .collect();

        let raw_specific: Vec<(SecurityId, f64)> = security_order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, regression_output.residuals[i].powi(2)))
            .collect();
        let sector_by_security: HashMap<SecurityId, String> =
            cross_section.iter().map(|r| (r.security_id, r.sector.clone())).collect();
        let specific_variances = specific_risk::compute(
            month_end,
            &raw_specific,
            prior_specific_ewma,
            &sector_by_security,
            config.specific_risk_ewma_lambda,
            config.specific_risk_shrinkage_weight,
        );

        Ok(CrossSectionOutput {
            exposures,
            factor_returns,
            diagnostics: regression_output.diagnostics,
            specific_variances,
        })
    }

    /// Estimates the factor covariance matrix for `month_end` from trailing
    /// factor return history, applying blending/shrinkage/PSD projection
    /// per `config.flags`.
    ///
    /// `history` must be ordered ascending by month-end and hold one row
    /// per month, one column per factor in `factor_order`.
    #[must_use]
    pub fn build_factor_covariance(
        config: &Config,
        month_end: NaiveDate,
        factor_order: &[Factor],
        history: &DMatrix<f64>,
    ) -> Vec<FactorCovariance> {
        let long_window = history.nrows().min(config.factor_cov_window_months);
        let long_start = history.nrows() - long_window;
        let long = sample_covariance(&history.rows(long_start, long_window).into_owned());

        let mut cov = if config.flags.blend_short_long_cov {
            let short_window = history.nrows().min(config.factor_cov_short_window_months);
            let short_start = history.nrows() - short_window;
            let short = sample_covariance(&history.rows(short_start, short_window).into_owned());
            blend_short_long(&long, &short, 0.5)
        } else {
            long
        };

        if config.flags.shrink_cov {
            cov = shrink_to_diagonal(&cov, 0.2);
        }
        if config.flags.enforce_psd {
            cov = project_psd(&cov);
        }

        let mut rows = Vec::new();
        for (i, factor_i) in factor_order.iter().enumerate() {
            for (j, factor_j) in factor_order.iter().enumerate() {
                rows.push(FactorCovariance {
                    factor_i: factor_i.clone(),
                    factor_j: factor_j.clone(),
                    month_end,
                    covariance: cov[(i, j)],
                });
            }
        }
        rows
    }
}

/// Reconstructs a [`Factor`] from its stable string key (the inverse of
/// [`Factor::key`]).
fn factor_for_key(key: &str) -> Factor {
    if let Some(rest) = key.strip_prefix("industry::") {
        if let Some((level, label)) = rest.split_once("::") {
            return Factor::Industry {
                level: level.to_string(),
                label: label.to_string(),
            };
        }
    }
    if let Some(label) = key.strip_prefix("country::") {
        return Factor::Country(label.to_string());
    }
    Factor::Style(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;

    fn record(id: u64, month_end: NaiveDate, market_cap: f64, ret: f64) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end,
            market_cap,
            monthly_return: ret,
            sales_ttm: 1.0e8,
            income_ttm: 5.0e6,
            quarterly_eps: vec![0.1, 0.11, 0.09, 0.12],
            book_equity: 5.0e7,
            total_assets: 2.0e8,
            short_term_debt: 1.0e7,
            long_term_debt: 2.0e7,
            dividends_ttm: 1.0e6,
            currency_index_return: 0.001,
            market_index_return: 0.01,
            sector: "Financials".into(),
            industry: "Banks".into(),
            sub_industry: "Regional Banks".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn cross_section_pipeline_produces_exposures_and_returns() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let panel = RiskPanel::new(vec![
            record(1, month_end, 1.0e9, 0.02),
            record(2, month_end, 2.0e9, -0.01),
            record(3, month_end, 1.5e9, 0.03),
            record(4, month_end, 0.8e9, 0.00),
        ]);
        let config = Config::default();
        let builder = RiskModelBuilder;
        let out = builder
            .build_cross_section(&panel, &config, month_end, month_end, &HashMap::new())
            .unwrap();
        assert!(!out.exposures.is_empty());
        assert!(!out.factor_returns.is_empty());
        assert_eq!(out.specific_variances.len(), 4);
    }

    #[test]
    fn imputed_exposures_are_flagged() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let mut securities = vec![
            record(1, month_end, 1.0e9, 0.02),
            record(2, month_end, 2.0e9, -0.01),
            record(3, month_end, 1.5e9, 0.03),
            record(4, month_end, 0.8e9, 0.00),
        ];
        // Security 4 has no defined book-to-price (non-positive book
        // equity), so it must be filled in by sector median imputation.
        securities[3].book_equity = -1.0;
        let panel = RiskPanel::new(securities);
        let config = Config::default();
        let builder = RiskModelBuilder;
        let out = builder
            .build_cross_section(&panel, &config, month_end, month_end, &HashMap::new())
            .unwrap();

        let flagged = out
            .exposures
            .iter()
            .find(|e| e.security_id == SecurityId::from(4) && e.factor == Factor::Style(style_names::BOOK_TO_PRICE.to_string()))
            .unwrap();
        assert!(flagged.is_imputed());
        assert_eq!(flagged.flags, "imputed:sector_median");

        let observed = out
            .exposures
            .iter()
            .find(|e| e.security_id == SecurityId::from(1) && e.factor == Factor::Style(style_names::BOOK_TO_PRICE.to_string()))
            .unwrap();
        assert!(!observed.is_imputed());
    }

    #[test]
    fn factor_for_key_round_trips() {
        let industry = Factor::Industry {
            level: "sector".into(),
            label: "Financials".into(),
        };
        assert_eq!(factor_for_key(&industry.key()), industry);
        let country = Factor::Country("US".into());
        assert_eq!(factor_for_key(&country.key()), country);
        let style = Factor::Style("Size".into());
        assert_eq!(factor_for_key(&style.key()), style);
    }
}
