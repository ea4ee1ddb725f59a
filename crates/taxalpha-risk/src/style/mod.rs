//! Style factor construction.
//!
//! Each submodule computes one factor's *raw* cross-sectional signal for a
//! month-end: a raw value per security, nothing standardized yet.
//! [`winsorize_and_standardize`]
//! is the shared post-processing step every factor funnels through, so the
//! winsorization/z-score math lives in one place rather than being
//! re-implemented ten times.

pub mod beta;
pub mod book_to_price;
pub mod currency_sensitivity;
pub mod dividend_yield;
pub mod earnings_variability;
pub mod earnings_yield;
pub mod growth;
pub mod leverage;
pub mod momentum;
pub mod size;

use chrono::NaiveDate;
use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;

/// A computed style factor: produces a raw cross-sectional signal for one
/// month-end from the panel, which [`winsorize_and_standardize`] then turns
/// into a standardized exposure.
pub trait StyleFactor {
    /// The factor's canonical name (see `taxalpha_core::factor::style_names`).
    fn name(&self) -> &'static str;

    /// Raw, unstandardized signal values for every security with enough
    /// history to compute one, as of `month_end`. Securities that cannot be
    /// scored are simply absent from the result; [`crate::imputation`]
    /// fills them in afterward.
    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)>;
}

/// Winsorizes at the given percentile on each tail, then cross-sectionally
/// z-scores. The shared post-processing step every style factor funnels
/// its raw signal through.
#[must_use]
pub fn winsorize_and_standardize(mut values: Vec<f64>, winsorize_pct: f64) -> Vec<f64> {
    winsorize(&mut values, winsorize_pct);
    let (standardized, _) = taxalpha_core::stats::standardize(&values);
    standardized
}

/// Clamps each finite value to the `[winsorize_pct, 1 - winsorize_pct]`
/// empirical quantile range of the input, in place. Non-finite values pass
/// through untouched (imputation handles those separately).
pub fn winsorize(values: &mut [f64], winsorize_pct: f64) {
    if values.is_empty() {
        return;
    }
    let mut sorted: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();
    if sorted.is_empty() {
        return;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let n = sorted.len();
    let lower_idx = ((n as f64) * winsorize_pct).floor() as usize;
    let upper_idx = (((n as f64) * (1.0 - winsorize_pct)).ceil() as usize).min(n - 1);
    let lower_bound = sorted[lower_idx];
    let upper_bound = sorted[upper_idx];

    for v in values.iter_mut() {
        if v.is_finite() {
            *v = v.clamp(lower_bound, upper_bound);
        }
    }
}

/// Default winsorization percentile applied to every style factor (1%/99%).
pub const DEFAULT_WINSORIZE_PCT: f64 = 0.01;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winsorize_clamps_tails() {
        let mut values: Vec<f64> = (1..=10).map(f64::from).collect();
        winsorize(&mut values, 0.2);
        assert!(values.iter().all(|&v| (3.0..=9.0).contains(&v)));
    }

    #[test]
    fn winsorize_and_standardize_has_zero_mean() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let standardized = winsorize_and_standardize(values, DEFAULT_WINSORIZE_PCT);
        let mean: f64 = standardized.iter().sum::<f64>() / standardized.len() as f64;
        assert!(mean.abs() < 1e-9);
    }
}
