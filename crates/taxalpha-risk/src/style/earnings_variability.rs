//! Earnings variability: negative coefficient of variation of trailing
//! quarterly earnings, so that *lower* variability scores higher (more
//! stable earners load positively on a "quality-like" axis).

use chrono::NaiveDate;
use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// Requires at least this many trailing quarterly EPS observations.
const MIN_QUARTERS: usize = 4;

/// `-std(quarterly_eps) / mean(|quarterly_eps|)`, i.e. the negative
/// coefficient of variation of trailing quarterly earnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarningsVariability;

impl StyleFactor for EarningsVariability {
    fn name(&self) -> &'static str {
        taxalpha_core::factor::style_names::EARNINGS_VARIABILITY
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .filter_map(|r| {
                if r.quarterly_eps.len() < MIN_QUARTERS {
                    return None;
                }
                let n = r.quarterly_eps.len() as f64;
                let mean = r.quarterly_eps.iter().sum::<f64>() / n;
                let mean_abs = r.quarterly_eps.iter().map(|v| v.abs()).sum::<f64>() / n;
                if mean_abs < 1e-10 {
                    return None;
                }
                let variance = r.quarterly_eps.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                Some((r.security_id, -variance.sqrt() / mean_abs))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;

    fn record(id: u64, quarterly_eps: Vec<f64>) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            market_cap: 1.0,
            monthly_return: 0.0,
            sales_ttm: 0.0,
            income_ttm: 0.0,
            quarterly_eps,
            book_equity: 0.0,
            total_assets: 0.0,
            short_term_debt: 0.0,
            long_term_debt: 0.0,
            dividends_ttm: 0.0,
            currency_index_return: 0.0,
            market_index_return: 0.0,
            sector: "Health Care".into(),
            industry: "Pharmaceuticals".into(),
            sub_industry: "Pharmaceuticals".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn stable_earner_scores_higher_than_volatile_one() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let panel = RiskPanel::new(vec![
            record(1, vec![1.0, 1.01, 0.99, 1.0]),
            record(2, vec![1.0, 3.0, -1.0, 2.0]),
        ]);
        let out = EarningsVariability.raw_signal(&panel, month_end);
        assert_eq!(out.len(), 2);
        assert!(out[0].1 > out[1].1);
    }

    #[test]
    fn too_few_quarters_is_excluded() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let panel = RiskPanel::new(vec![record(1, vec![1.0, 1.1])]);
        assert!(EarningsVariability.raw_signal(&panel, month_end).is_empty());
    }
}
