//! Assembling the dense risk-model matrices (`X`, `F`, `D`) the QP solver
//! needs out of the risk model's tabular output.

use std::collections::{BTreeMap, HashMap};

use nalgebra::{DMatrix, DVector};

use taxalpha_core::{Exposure, Factor, FactorCovariance, SecurityId, SpecificVariance};

use crate::error::{OptimizeError, Result};

/// The risk model, densified for a specific optimization universe: an
/// exposure matrix `X` (securities x factors), a factor covariance matrix
/// `F` (factors x factors), and a specific-variance vector `D`.
#[derive(Debug, Clone)]
pub struct RiskMatrices {
    /// Securities in the optimization universe, in matrix row order.
    pub securities: Vec<SecurityId>,
    /// Factors referenced by the exposure matrix, in matrix column order.
    pub factors: Vec<Factor>,
    /// `n x k` exposure matrix.
    pub exposures: DMatrix<f64>,
    /// `k x k` symmetric factor covariance matrix.
    pub factor_covariance: DMatrix<f64>,
    /// `n`-length specific variance vector (the shrunk column).
    pub specific_variance: DVector<f64>,
}

/// Builds [`RiskMatrices`] for `universe`. Every security in `universe`
/// must appear in `exposures` at least once, and every factor referenced
/// by `exposures` must have a diagonal entry in `factor_covariance`.
///
/// # Errors
///
/// Returns [`OptimizeError::EmptyUniverse`], [`OptimizeError::MissingExposures`],
/// or [`OptimizeError::MissingFactorCovariance`].
pub fn build(
    universe: &[SecurityId],
    exposures: &[Exposure],
    factor_covariance: &[FactorCovariance],
    specific_variance: &[SpecificVariance],
) -> Result<RiskMatrices> {
    if universe.is_empty() {
        return Err(OptimizeError::EmptyUniverse);
    }

    let security_index: HashMap<SecurityId, usize> =
        universe.iter().enumerate().map(|(i, &s)| (s, i)).collect();

    let mut factor_keys: BTreeMap<String, Factor> = BTreeMap::new();
    let mut seen_securities: HashMap<SecurityId, bool> =
        universe.iter().map(|&s| (s, false)).collect();
    for exposure in exposures {
        if security_index.contains_key(&exposure.security_id) {
            factor_keys
                .entry(exposure.factor.key())
                .or_insert_with(|| exposure.factor.clone());
            seen_securities.insert(exposure.security_id, true);
        }
    }

    for &security_id in universe {
        if !seen_securities.get(&security_id).copied().unwrap_or(false) {
            return Err(OptimizeError::MissingExposures { security_id });
        }
    }

    let factors: Vec<Factor> = factor_keys.into_values().collect();
    let factor_index: HashMap<String, usize> = factors
        .iter()
        .enumerate()
        .map(|(i, f)| (f.key(), i))
        .collect();

    let n = universe.len();
    let k = factors.len();

    let mut x = DMatrix::<f64>::zeros(n, k);
    for exposure in exposures {
        if let (Some(&i), Some(&j)) = (
            security_index.get(&exposure.security_id),
            factor_index.get(&exposure.factor.key()),
        ) {
            x[(i, j)] = exposure.value;
        }
    }

    let mut f = DMatrix::<f64>::zeros(k, k);
    for cov in factor_covariance {
        if let (Some(&i), Some(&j)) = (
            factor_index.get(&cov.factor_i.key()),
            factor_index.get(&cov.factor_j.key()),
        ) {
            f[(i, j)] = cov.covariance;
            f[(j, i)] = cov.covariance;
        }
    }
    for (key, &idx) in &factor_index {
        if f[(idx, idx)] == 0.0 {
            return Err(OptimizeError::MissingFactorCovariance { factor: key.clone() });
        }
    }

    let specific_by_security: HashMap<SecurityId, f64> = specific_variance
        .iter()
        .map(|s| (s.security_id, s.shrunk))
        .collect();
    let mut d = DVector::<f64>::zeros(n);
    for (&security_id, &i) in &security_index {
        d[i] = specific_by_security.get(&security_id).copied().unwrap_or(0.0);
    }

    Ok(RiskMatrices {
        securities: universe.to_vec(),
        factors,
        exposures: x,
        factor_covariance: f,
        specific_variance: d,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn exposure(security_id: u64, factor: Factor, value: f64) -> Exposure {
        Exposure {
            security_id: SecurityId(security_id),
            factor,
            month_end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            value,
            flags: String::new(),
            computed_at: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        }
    }

    fn cov(a: Factor, b: Factor, value: f64) -> FactorCovariance {
        FactorCovariance {
            factor_i: a,
            factor_j: b,
            month_end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            covariance: value,
        }
    }

    #[test]
    fn builds_dense_matrices_in_deterministic_order() {
        let size = Factor::Style("Size".into());
        let beta = Factor::Style("Beta".into());
        let universe = vec![SecurityId(1), SecurityId(2)];
        let exposures = vec![
            exposure(1, size.clone(), 0.5),
            exposure(1, beta.clone(), -0.2),
            exposure(2, size.clone(), -0.5),
            exposure(2, beta.clone(), 0.3),
        ];
        let factor_cov = vec![
            cov(size.clone(), size.clone(), 0.04),
            cov(beta.clone(), beta.clone(), 0.02),
            cov(size, beta, 0.001),
        ];
        let matrices = build(&universe, &exposures, &factor_cov, &[]).unwrap();
        assert_eq!(matrices.factors.len(), 2);
        assert_eq!(matrices.exposures.shape(), (2, 2));
        assert_eq!(matrices.factor_covariance.shape(), (2, 2));
        assert!((matrices.factor_covariance[(0, 1)] - matrices.factor_covariance[(1, 0)]).abs() < 1e-12);
    }

    #[test]
    fn missing_exposures_for_a_universe_security_is_an_error() {
        let size = Factor::Style("Size".into());
        let universe = vec![SecurityId(1), SecurityId(2)];
        let exposures = vec![exposure(1, size.clone(), 0.5)];
        let factor_cov = vec![cov(size.clone(), size, 0.04)];
        let result = build(&universe, &exposures, &factor_cov, &[]);
        assert!(matches!(result, Err(OptimizeError::MissingExposures { .. })));
    }

    #[test]
    fn missing_factor_covariance_is_an_error() {
        let size = Factor::Style("Size".into());
        let universe = vec![SecurityId(1)];
        let exposures = vec![exposure(1, size, 0.5)];
        let result = build(&universe, &exposures, &[], &[]);
        assert!(matches!(result, Err(OptimizeError::MissingFactorCovariance { .. })));
    }
}
