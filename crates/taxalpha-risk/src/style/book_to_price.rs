//! Book-to-price: log ratio of book equity to market capitalization.

use chrono::NaiveDate;
use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// `log(book_equity / market_cap)`. Securities with non-positive book
/// equity (common for some financials and recent IPOs) have no defined
/// value and are left for imputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookToPrice;

impl StyleFactor for BookToPrice {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::BOOK_TO_PRICE
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .filter(|r| r.market_cap > 0.0 && r.book_equity > 0.0)
            .map(|r| (r.security_id, (r.book_equity / r.market_cap).ln()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;

    fn record(book_equity: f64, market_cap: f64) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(1),
            month_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            market_cap,
            monthly_return: 0.0,
            sales_ttm: 0.0,
            income_ttm: 0.0,
            quarterly_eps: vec![],
            book_equity,
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
    fn negative_book_equity_is_excluded() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let panel = RiskPanel::new(vec![record(-1.0e6, 1.0e8)]);
        assert!(BookToPrice.raw_signal(&panel, month_end).is_empty());
    }

    #[test]
    fn positive_book_equity_is_log_ratio() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let panel = RiskPanel::new(vec![record(5.0e7, 1.0e8)]);
        let out = BookToPrice.raw_signal(&panel, month_end);
        assert_eq!(out.len(), 1);
        assert!((out[0].1 - 0.5_f64.ln()).abs() < 1e-9);
    }
}
