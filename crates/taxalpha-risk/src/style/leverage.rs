//! Leverage: total debt over total assets.

use chrono::NaiveDate;
use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// `(short_term_debt + long_term_debt) / total_assets`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Leverage;

impl StyleFactor for Leverage {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::LEVERAGE
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .filter(|r| r.total_assets > 0.0)
            .map(|r| {
                (
                    r.security_id,
                    (r.short_term_debt + r.long_term_debt) / r.total_assets,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;
    use approx::assert_relative_eq;

    #[test]
    fn leverage_sums_both_debt_tiers() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let record = MonthlyRecord {
            security_id: SecurityId::from(1),
            month_end,
            market_cap: 1.0,
            monthly_return: 0.0,
            sales_ttm: 0.0,
            income_ttm: 0.0,
            quarterly_eps: vec![],
            book_equity: 0.0,
            total_assets: 1.0e9,
            short_term_debt: 1.0e8,
            long_term_debt: 2.0e8,
            dividends_ttm: 0.0,
            currency_index_return: 0.0,
            market_index_return: 0.0,
            sector: "Utilities".into(),
            industry: "Electric Utilities".into(),
            sub_industry: "Electric Utilities".into(),
            country: "US".into(),
        };
        let panel = RiskPanel::new(vec![record]);
        let out = Leverage.raw_signal(&panel, month_end);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].1, 0.3);
    }
}
