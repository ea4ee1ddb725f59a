//! Orthogonalizing non-Size style factors against Size.
//!
//! Runs after imputation (imputed values are already near-centered medians
//! of already-standardized factors, so orthogonalizing first would regress
//! against partly-synthetic data). Each style factor other than Size is
//! replaced with the residual of its cross-sectional OLS regression on
//! Size, removing the portion of the signal that is just a restatement of
//! firm size.

use std::collections::HashMap;

use taxalpha_core::SecurityId;

/// Regresses `values` (keyed by security) on `size` (keyed by security,
/// same universe) with an intercept, and returns the residuals in the
/// same order as `values`. Securities present in `values` but absent from
/// `size` are passed through unchanged.
#[must_use]
pub fn orthogonalize_against_size(
    values: &[(SecurityId, f64)],
    size: &[(SecurityId, f64)],
) -> Vec<(SecurityId, f64)> {
    let size_by_id: HashMap<SecurityId, f64> = size.iter().copied().collect();

    let paired: Vec<(f64, f64)> = values
        .iter()
        .filter_map(|(id, v)| size_by_id.get(id).map(|s| (*s, *v)))
        .collect();

    let Some((intercept, slope)) = ols_with_intercept(&paired) else {
        return values.to_vec();
    };

    values
        .iter()
        .map(|(id, v)| match size_by_id.get(id) {
            Some(s) => (*id, v - (intercept + slope * s)),
            None => (*id, *v),
        })
        .collect()
}

/// OLS intercept and slope of `y` on `x` from `(x, y)` pairs. `None` if
/// there are fewer than two points or `x` has no variance.
fn ols_with_intercept(pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = pairs.len() as f64;
    if n < 2.0 {
        return None;
    }
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
    }
    if var_x < 1e-12 {
        return None;
    }
    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;
    Some((intercept, slope))
}
