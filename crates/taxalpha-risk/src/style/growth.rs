//! Growth: year-over-year sales growth, with a 3-year CAGR multi-horizon
//! variant.

use chrono::NaiveDate;

use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// Sales growth over `horizon_months`, annualized as a CAGR when the
/// horizon exceeds a year.
#[derive(Debug, Clone, Copy)]
pub struct Growth {
    /// The factor's name (`Growth` or `Growth3Y`).
    pub factor_name: &'static str,
    /// Months between the current and comparison observations.
    pub horizon_months: usize,
}

impl Growth {
    /// The canonical year-over-year sales growth factor.
    #[must_use]
    pub const fn canonical() -> Self {
        Self {
            factor_name: taxalpha_core::factor::style_names::GROWTH,
            horizon_months: 12,
        }
    }

    /// The 3-year sales CAGR multi-horizon variant.
    #[must_use]
    pub const fn three_year() -> Self {
        Self {
            factor_name: taxalpha_core::factor::style_names::GROWTH_3Y,
            horizon_months: 36,
        }
    }
}

impl StyleFactor for Growth {
    fn name(&self) -> &'static str {
        self.factor_name
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .map(|r| r.security_id)
            .filter_map(|security_id| {
                let history = panel.history(security_id, month_end, self.horizon_months + 1);
                if history.len() <= self.horizon_months {
                    return None;
                }
                let current = history.last()?.sales_ttm;
                let prior = history.first()?.sales_ttm;
                if prior <= 0.0 || current <= 0.0 {
                    return None;
                }
                let years = self.horizon_months as f64 / 12.0;
                let value = if years > 1.0 {
                    (current / prior).powf(1.0 / years) - 1.0
                } else {
                    current / prior - 1.0
                };
                Some((security_id, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;
    use approx::assert_relative_eq;

    fn record(id: u64, month_end: NaiveDate, sales_ttm: f64) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end,
            market_cap: 1.0,
            monthly_return: 0.0,
            sales_ttm,
            income_ttm: 0.0,
            quarterly_eps: vec![],
            book_equity: 0.0,
            total_assets: 0.0,
            short_term_debt: 0.0,
            long_term_debt: 0.0,
            dividends_ttm: 0.0,
            currency_index_return: 0.0,
            market_index_return: 0.0,
            sector: "Industrials".into(),
            industry: "Machinery".into(),
            sub_industry: "Industrial Machinery".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn yoy_growth_compares_twelve_months_back() {
        let dates: Vec<NaiveDate> = (1..=13).map(|m| {
            let year = 2023 + (m - 1) / 12;
            let month = ((m - 1) % 12) + 1;
            NaiveDate::from_ymd_opt(year, month, 1).unwrap()
        }).collect();
        let mut records = Vec::new();
        for (i, d) in dates.iter().enumerate() {
            let sales = 100.0 * 1.05_f64.powi(i as i32);
            records.push(record(1, *d, sales));
        }
        let panel = RiskPanel::new(records);
        let out = Growth::canonical().raw_signal(&panel, *dates.last().unwrap());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].1, 1.05_f64.powi(12) - 1.0, epsilon = 1e-9);
    }
}
