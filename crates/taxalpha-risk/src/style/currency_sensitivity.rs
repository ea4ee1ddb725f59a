//! Currency sensitivity: regression slope against a dollar-index ETF.

use chrono::NaiveDate;

use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::beta::ols_slope;
use crate::style::StyleFactor;

/// Sensitivity of a security's monthly return to a broad dollar-index
/// ETF's monthly return over a trailing window, estimated the same way as
/// [`crate::style::beta::Beta`] but against the currency series instead of
/// the market series.
#[derive(Debug, Clone, Copy)]
pub struct CurrencySensitivity {
    /// Trailing window, in months.
    pub lookback_months: usize,
    /// Minimum monthly observations required to produce a value.
    pub min_obs: usize,
}

impl CurrencySensitivity {
    /// Builds a `CurrencySensitivity` factor with the given window and
    /// minimum observations.
    #[must_use]
    pub const fn new(lookback_months: usize, min_obs: usize) -> Self {
        Self {
            lookback_months,
            min_obs,
        }
    }
}

impl StyleFactor for CurrencySensitivity {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::CURRENCY_SENSITIVITY
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
                let currency_returns: Vec<f64> =
                    history.iter().map(|r| r.currency_index_return).collect();
                ols_slope(&currency_returns, &security_returns).map(|slope| (security_id, slope))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;
    use approx::assert_relative_eq;

    fn record(id: u64, month_end: NaiveDate, security_ret: f64, currency_ret: f64) -> MonthlyRecord {
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
            currency_index_return: currency_ret,
            market_index_return: 0.0,
            sector: "Energy".into(),
            industry: "Oil & Gas".into(),
            sub_industry: "Integrated Oil & Gas".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn recovers_exact_slope() {
        let dates: Vec<NaiveDate> = (1..=24).map(|m| {
            let year = 2023 + (m - 1) / 12;
            let month = ((m - 1) % 12) + 1;
            NaiveDate::from_ymd_opt(year, month, 1).unwrap()
        }).collect();
        let mut records = Vec::new();
        for (i, d) in dates.iter().enumerate() {
            let currency_ret = 0.002 * ((i % 7) as f64 - 3.0);
            records.push(record(1, *d, -0.8 * currency_ret, currency_ret));
        }
        let panel = RiskPanel::new(records);
        let factor = CurrencySensitivity::new(24, 12);
        let out = factor.raw_signal(&panel, *dates.last().unwrap());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].1, -0.8, epsilon = 1e-9);
    }
}
