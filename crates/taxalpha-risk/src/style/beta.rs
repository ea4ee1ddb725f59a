//! Beta: market sensitivity over a trailing window.

use chrono::NaiveDate;

use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// Market beta, estimated as the OLS slope of a security's monthly returns
/// on the market index's monthly returns over a trailing window.
#[derive(Debug, Clone, Copy)]
pub struct Beta {
    /// Trailing window, in months.
    pub lookback_months: usize,
    /// Minimum monthly observations required to produce a value.
    pub min_obs: usize,
}

impl Beta {
    /// Builds a `Beta` factor with the given window and minimum observations.
    #[must_use]
    pub const fn new(lookback_months: usize, min_obs: usize) -> Self {
        Self {
            lookback_months,
            min_obs,
        }
    }
}

impl StyleFactor for Beta {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::BETA
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .map(|r| r.security_id)
            .filter_map(|security_id| {
                let history = panel.history(security_id, month_end, self.lookback_months);
                if history.len() < self.min_obs {
                    return None;
                }
                let security_returns: Vec<f64> = history.iter().map(|r| r.monthly_return).collect();
                let market_returns: Vec<f64> = history.iter().map(|r| r.market_index_return).collect();
                ols_slope(&market_returns, &security_returns).map(|slope| (security_id, slope))
            })
            .collect()
    }
}

/// OLS slope of `y` on `x`: `cov(x, y) / var(x)`. `None` if `x` has
/// essentially no variance. Shared with [`crate::style::currency_sensitivity`].
pub(crate) fn ols_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    if n < 2.0 {
        return None;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        cov += (xi - mean_x) * (yi - mean_y);
        var_x += (xi - mean_x).powi(2);
    }
    if var_x < 1e-12 {
        return None;
    }
    Some(cov / var_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;
    use approx::assert_relative_eq;

    fn record(id: u64, month_end: NaiveDate, security_ret: f64, market_ret: f64) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end,
            market_cap: 1.0,
            monthly_return: security_ret,
            sales_ttm: 0.0,
            income_ttm: 0.0,
            quarterly_eps: vec![],
            book_equity: 0.0,
            total_assets: 0.0,
            short_term_debt: 0.0,
            long_term_debt: 0.0,
            dividends_ttm: 0.0,
            currency_index_return: 0.0,
            market_index_return: market_ret,
            sector: "Financials".into(),
            industry: "Banks".into(),
            sub_industry: "Regional Banks".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn beta_recovers_exact_slope() {
        let dates: Vec<NaiveDate> = (1..=12).map(|m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap()).collect();
        let mut records = Vec::new();
        for (i, d) in dates.iter().enumerate() {
            let market_ret = 0.01 * (i as f64 - 5.0);
            records.push(record(1, *d, 1.5 * market_ret, market_ret));
        }
        let panel = RiskPanel::new(records);
        let beta = Beta::new(12, 6);
        let out = beta.raw_signal(&panel, *dates.last().unwrap());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].1, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn beta_requires_minimum_observations() {
        let dates: Vec<NaiveDate> = (1..=3).map(|m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap()).collect();
        let records: Vec<MonthlyRecord> = dates.iter().map(|d| record(1, *d, 0.01, 0.01)).collect();
        let panel = RiskPanel::new(records);
        let beta = Beta::new(60, 36);
        assert!(beta.raw_signal(&panel, *dates.last().unwrap()).is_empty());
    }
}
