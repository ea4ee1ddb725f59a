//! Missing-value imputation for standardized style factor exposures.
//!
//! A security that cannot be scored by a factor (insufficient history, a
//! non-positive denominator, etc.) is not simply dropped from the
//! cross-section: once the factor's observed securities have been
//! winsorized and z-scored, the missing ones are filled in with their
//! sector's median of that standardized population, so every security
//! still gets an exposure row for every factor. Rows that needed this are
//! flagged `"imputed:sector_median"` so [`crate::model`] can warn when a
//! factor's imputation rate crosses the configured threshold.

use std::collections::HashMap;

use taxalpha_core::SecurityId;

/// A raw signal value for a security, plus whether it was imputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImputedValue {
    /// The security this value belongs to.
    pub security_id: SecurityId,
    /// The standardized (post-winsorization/z-score) exposure value.
    pub value: f64,
    /// Whether this value was imputed rather than observed.
    pub imputed: bool,
}

/// Fills in every security present in `universe` but absent from
/// `standardized` with its sector's median of the observed standardized
/// values. Securities whose sector has no observed values at all fall
/// back to the overall median; if there are no observed values anywhere,
/// the factor is left empty.
#[must_use]
pub fn impute_by_sector_median(
    standardized: &[(SecurityId, f64)],
    universe: &[(SecurityId, &str)],
) -> Vec<ImputedValue> {
    let observed: HashMap<SecurityId, f64> = standardized.iter().copied().collect();

    let mut by_sector: HashMap<&str, Vec<f64>> = HashMap::new();
    for (security_id, sector) in universe {
        if let Some(value) = observed.get(security_id) {
            by_sector.entry(sector).or_default().push(*value);
        }
    }
    let sector_medians: HashMap<&str, f64> = by_sector
        .into_iter()
        .filter_map(|(sector, mut values)| median(&mut values).map(|m| (sector, m)))
        .collect();

    let mut all_observed: Vec<f64> = observed.values().copied().collect();
    let overall_median = median(&mut all_observed);

    universe
        .iter()
        .filter_map(|(security_id, sector)| {
            if let Some(value) = observed.get(security_id) {
                return Some(ImputedValue {
                    security_id: *security_id,
                    value: *value,
                    imputed: false,
                });
            }
            let fill = sector_medians.get(sector).copied().or(overall_median)?;
            Some(ImputedValue {
                security_id: *security_id,
                value: fill,
                imputed: true,
            })
        })
        .collect()
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    Some(if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    })
}

/// Fraction of `values` that were imputed.
#[must_use]
pub fn imputation_rate(values: &[ImputedValue]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| v.imputed).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_security_gets_sector_median() {
        let raw = vec![(SecurityId::from(1), 1.0), (SecurityId::from(2), 3.0)];
        let universe = vec![
            (SecurityId::from(1), "Financials"),
            (SecurityId::from(2), "Financials"),
            (SecurityId::from(3), "Financials"),
        ];
        let out = impute_by_sector_median(&raw, &universe);
        let imputed = out.iter().find(|v| v.security_id == SecurityId::from(3)).unwrap();
        assert!(imputed.imputed);
        assert_eq!(imputed.value, 2.0);
    }

    #[test]
    fn imputation_rate_counts_fraction() {
        let raw = vec![(SecurityId::from(1), 1.0)];
        let universe = vec![(SecurityId::from(1), "Tech"), (SecurityId::from(2), "Tech")];
        let out = impute_by_sector_median(&raw, &universe);
        assert_eq!(imputation_rate(&out), 0.5);
    }
}
