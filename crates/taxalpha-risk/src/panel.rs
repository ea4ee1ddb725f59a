//! The monthly security panel the risk model is built from.
//!
//! Inputs arrive with a richer, partly textual schema (classification
//! labels, per-quarter earnings history) than fits comfortably in a
//! single `polars::DataFrame` row, so the panel is a typed `Vec` rather
//! than a DataFrame wrapper. Individual style factors still pull their
//! working vectors out into plain `Vec<f64>` before winsorizing/
//! standardizing; `classification.rs` and `model.rs` build
//! `polars::DataFrame`s for the pieces that benefit from it (one-hot
//! matrices, exported exposures).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use taxalpha_core::SecurityId;

/// One security's observation for one month-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// The security this record describes.
    pub security_id: SecurityId,
    /// Month-end this record is dated as of.
    pub month_end: NaiveDate,
    /// Market capitalization.
    pub market_cap: f64,
    /// Total return for the month (as a fraction, e.g. `0.03` for 3%).
    pub monthly_return: f64,
    /// Trailing twelve-month sales.
    pub sales_ttm: f64,
    /// Trailing twelve-month net income.
    pub income_ttm: f64,
    /// Trailing eight quarterly EPS observations, most recent last.
    /// Shorter histories are allowed; `EarningsVariability` requires at
    /// least four to produce a value.
    pub quarterly_eps: Vec<f64>,
    /// Book value of common equity.
    pub book_equity: f64,
    /// Total assets.
    pub total_assets: f64,
    /// Short-term debt (current portion of long-term debt plus notes payable).
    pub short_term_debt: f64,
    /// Long-term debt.
    pub long_term_debt: f64,
    /// Trailing twelve-month common dividends paid.
    pub dividends_ttm: f64,
    /// Return on a broad dollar-index ETF for the month, used by
    /// `CurrencySensitivity`. Identical across securities within a month.
    pub currency_index_return: f64,
    /// Return on the cap-weighted market proxy for the month, used by
    /// `Beta`. Identical across securities within a month.
    pub market_index_return: f64,
    /// GICS sector label.
    pub sector: String,
    /// GICS industry label.
    pub industry: String,
    /// GICS sub-industry label.
    pub sub_industry: String,
    /// Domicile/listing country.
    pub country: String,
}

/// The full monthly panel a risk model is estimated from: every security,
/// every month-end it has an observation for.
#[derive(Debug, Clone, Default)]
pub struct RiskPanel {
    records: Vec<MonthlyRecord>,
}

impl RiskPanel {
    /// Builds a panel from a flat list of monthly records.
    #[must_use]
    pub fn new(records: Vec<MonthlyRecord>) -> Self {
        Self { records }
    }

    /// All records, regardless of month.
    #[must_use]
    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    /// Every record dated exactly `month_end`.
    #[must_use]
    pub fn cross_section(&self, month_end: NaiveDate) -> Vec<&MonthlyRecord> {
        self.records
            .iter()
            .filter(|r| r.month_end == month_end)
            .collect()
    }

    /// A single security's history up to and including `as_of`, sorted
    /// ascending by month-end, keeping at most `months` trailing entries.
    #[must_use]
    pub fn history(&self, security_id: SecurityId, as_of: NaiveDate, months: usize) -> Vec<&MonthlyRecord> {
        let mut rows: Vec<&MonthlyRecord> = self
            .records
            .iter()
            .filter(|r| r.security_id == security_id && r.month_end <= as_of)
            .collect();
        rows.sort_by_key(|r| r.month_end);
        if rows.len() > months {
            let skip = rows.len() - months;
            rows.drain(..skip);
        }
        rows
    }

    /// Distinct month-ends present in the panel, ascending.
    #[must_use]
    pub fn month_ends(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.month_end).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxalpha_core::SecurityId;

    fn record(id: u64, month_end: NaiveDate, ret: f64) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end,
            market_cap: 1.0e9,
            monthly_return: ret,
            sales_ttm: 1.0e8,
            income_ttm: 1.0e7,
            quarterly_eps: vec![0.5, 0.52, 0.48, 0.55],
            book_equity: 5.0e8,
            total_assets: 2.0e9,
            short_term_debt: 1.0e8,
            long_term_debt: 3.0e8,
            dividends_ttm: 2.0e7,
            currency_index_return: 0.001,
            market_index_return: 0.01,
            sector: "Financials".into(),
            industry: "Banks".into(),
            sub_industry: "Regional Banks".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn cross_section_filters_by_month() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let panel = RiskPanel::new(vec![record(1, d1, 0.01), record(1, d2, 0.02), record(2, d1, -0.01)]);
        assert_eq!(panel.cross_section(d1).len(), 2);
        assert_eq!(panel.cross_section(d2).len(), 1);
    }

    #[test]
    fn history_is_ascending_and_capped() {
        let dates: Vec<NaiveDate> = (1..=6)
            .map(|m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap())
            .collect();
        let records: Vec<MonthlyRecord> = dates.iter().map(|d| record(1, *d, 0.0)).collect();
        let panel = RiskPanel::new(records);
        let hist = panel.history(SecurityId::from(1), *dates.last().unwrap(), 3);
        assert_eq!(hist.len(), 3);
        assert!(hist.windows(2).all(|w| w[0].month_end < w[1].month_end));
    }
}
