//! Dividend yield: trailing twelve-month common dividends over market cap.

use chrono::NaiveDate;
use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// `dividends_ttm / market_cap`. Non-payers score zero, which is a real
/// observation, not a missing value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DividendYield;

impl StyleFactor for DividendYield {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::DIVIDEND_YIELD
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .filter(|r| r.market_cap > 0.0)
            .map(|r| (r.security_id, r.dividends_ttm / r.market_cap))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;
    use approx::assert_relative_eq;

    #[test]
    fn non_payer_scores_zero() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let record = MonthlyRecord {
            security_id: SecurityId::from(1),
            month_end,
            market_cap: 1.0e8,
            monthly_return: 0.0,
            sales_ttm: 0.0,
            income_ttm: 0.0,
            quarterly_eps: vec![],
            book_equity: 0.0,
            total_assets: 0.0,
            short_term_debt: 0.0,
            long_term_debt: 0.0,
            dividends_ttm: 0.0,
            currency_index_return: 0.0,
            market_index_return: 0.0,
            sector: "Tech".into(),
            industry: "Software".into(),
            sub_industry: "Application Software".into(),
            country: "US".into(),
        };
        let panel = RiskPanel::new(vec![record]);
        let out = DividendYield.raw_signal(&panel, month_end);
        assert_relative_eq!(out[0].1, 0.0);
    }
}
