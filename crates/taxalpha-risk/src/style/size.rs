//! Size: log market capitalization.

use chrono::NaiveDate;
use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// Log market capitalization. The largest style factor by construction:
/// every other factor is orthogonalized against it when that flag is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Size;

impl StyleFactor for Size {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::SIZE
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .filter(|r| r.market_cap > 0.0)
            .map(|r| (r.security_id, r.market_cap.ln()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;
    use approx::assert_relative_eq;

    fn record(id: u64, market_cap: f64) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            market_cap,
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
            sector: "Financials".into(),
            industry: "Banks".into(),
            sub_industry: "Regional Banks".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn size_is_log_market_cap() {
        let panel = RiskPanel::new(vec![record(1, 1.0e9)]);
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let out = Size.raw_signal(&panel, month_end);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].1, 1.0e9_f64.ln());
    }

    #[test]
    fn nonpositive_market_cap_is_excluded() {
        let panel = RiskPanel::new(vec![record(1, 0.0)]);
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(Size.raw_signal(&panel, month_end).is_empty());
    }
}
