//! Industry and country one-hot classification exposures.

use chrono::NaiveDate;

use taxalpha_core::{Exposure, Factor, SecurityId};

use crate::panel::RiskPanel;

/// GICS classification levels built as separate one-hot blocks.
pub const LEVELS: [&str; 3] = ["sector", "industry", "sub_industry"];

/// Builds the one-hot sector/industry/sub_industry and country exposure
/// rows for every security in the cross-section at `month_end`. Within
/// each level (including `"country"`), every security's row sums to
/// exactly 1.
#[must_use]
pub fn classify(panel: &RiskPanel, month_end: NaiveDate, computed_at: NaiveDate) -> Vec<Exposure> {
    let cross_section = panel.cross_section(month_end);
    let mut exposures = Vec::new();

    for security in &cross_section {
        let labels = [&security.sector, &security.industry, &security.sub_industry];
        for (level, label) in LEVELS.iter().zip(labels) {
            exposures.push(Exposure {
                security_id: security.security_id,
                factor: Factor::Industry {
                    level: (*level).to_string(),
                    label: label.clone(),
                },
                month_end,
                value: 1.0,
                flags: String::new(),
                computed_at,
            });
        }
        exposures.push(Exposure {
            security_id: security.security_id,
            factor: Factor::Country(security.country.clone()),
            month_end,
            value: 1.0,
            flags: String::new(),
            computed_at,
        });
    }

    exposures
}

/// Checks that every security's exposures within `level` (a GICS level
/// name or `"country"`) sum to exactly 1, within `tolerance`.
#[must_use]
pub fn validate_one_hot(exposures: &[Exposure], level: &str, tolerance: f64) -> bool {
    use std::collections::HashMap;

    let mut sums: HashMap<SecurityId, f64> = HashMap::new();
    for exposure in exposures {
        let matches = match &exposure.factor {
            Factor::Industry { level: l, .. } if l == level => true,
            Factor::Country(_) if level == "country" => true,
            _ => false,
        };
        if matches {
            *sums.entry(exposure.security_id).or_insert(0.0) += exposure.value;
        }
    }
    sums.values().all(|sum| (sum - 1.0).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::MonthlyRecord;

    fn record(id: u64, sector: &str, country: &str) -> MonthlyRecord {
        MonthlyRecord {
            security_id: SecurityId::from(id),
            month_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            market_cap: 1.0,
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
            sector: sector.into(),
            industry: format!("{sector}-Industry"),
            sub_industry: format!("{sector}-SubIndustry"),
            country: country.into(),
        }
    }

    #[test]
    fn every_level_sums_to_one() {
        let month_end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let panel = RiskPanel::new(vec![record(1, "Financials", "US"), record(2, "Tech", "GB")]);
        let exposures = classify(&panel, month_end, month_end);
        for level in LEVELS.iter().chain(std::iter::once(&"country")) {
            assert!(validate_one_hot(&exposures, level, 1e-9), "level {level} did not sum to 1");
        }
    }
}
