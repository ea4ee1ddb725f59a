//! Specific (idiosyncratic) variance: the squared regression residual,
//! optionally smoothed via EWMA and shrunk toward the security's
//! industry median. All three columns are always computed; which one the
//! optimizer reads is controlled by `Config::flags::smooth_specific_risk`.

use std::collections::HashMap;

use chrono::NaiveDate;

use taxalpha_core::{SecurityId, SpecificVariance};

/// Builds this month's [`SpecificVariance`] rows from raw squared
/// residuals, the prior month's EWMA values (empty for the first month in
/// a series), and each security's sector label (for shrinkage).
#[must_use]
pub fn compute(
    month_end: NaiveDate,
    raw_by_security: &[(SecurityId, f64)],
    prior_ewma: &HashMap<SecurityId, f64>,
    sector_by_security: &HashMap<SecurityId, String>,
    ewma_lambda: f64,
    shrinkage_weight: f64,
) -> Vec<SpecificVariance> {
    let ewma_by_security: HashMap<SecurityId, f64> = raw_by_security
        .iter()
        .map(|(id, raw)| {
            let smoothed = match prior_ewma.get(id) {
                Some(prior) => ewma_lambda * prior + (1.0 - ewma_lambda) * raw,
                None => *raw,
            };
            (*id, smoothed)
        })
        .collect();

    let mut sector_values: HashMap<&str, Vec<f64>> = HashMap::new();
    for (id, ewma) in &ewma_by_security {
        if let Some(sector) = sector_by_security.get(id) {
            sector_values.entry(sector.as_str()).or_default().push(*ewma);
        }
    }
    let sector_medians: HashMap<&str, f64> = sector_values
        .into_iter()
        .filter_map(|(sector, mut values)| median(&mut values).map(|m| (sector, m)))
        .collect();

    raw_by_security
        .iter()
        .map(|(id, raw)| {
            let ewma = ewma_by_security[id];
            let shrunk = match sector_by_security.get(id).and_then(|s| sector_medians.get(s.as_str())) {
                Some(&sector_median) => (1.0 - shrinkage_weight) * ewma + shrinkage_weight * sector_median,
                None => ewma,
            };
            SpecificVariance {
                security_id: *id,
                month_end,
                raw: *raw,
                ewma,
                shrunk,
            }
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
