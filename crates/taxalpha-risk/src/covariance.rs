//! Factor covariance matrix estimation: sample covariance over a rolling
//! window, optional short/long blending, optional shrinkage toward the
//! diagonal, and PSD projection via eigenvalue clipping.

use nalgebra::DMatrix;

/// Floor applied to clipped eigenvalues during PSD projection. Strictly
/// positive so the reconstructed matrix stays invertible.
const PSD_EIGENVALUE_FLOOR: f64 = 1.0e-12;

/// Sample covariance of factor returns. `factor_returns` has one row per
/// month and one column per factor; the result is `n_factors x n_factors`.
#[must_use]
pub fn sample_covariance(factor_returns: &DMatrix<f64>) -> DMatrix<f64> {
    let n_months = factor_returns.nrows();
    let n_factors = factor_returns.ncols();
    if n_months < 2 {
        return DMatrix::zeros(n_factors, n_factors);
    }

    let means: Vec<f64> = (0..n_factors)
        .map(|j| factor_returns.column(j).sum() / n_months as f64)
        .collect();

    let centered = DMatrix::from_fn(n_months, n_factors, |i, j| factor_returns[(i, j)] - means[j]);
    (centered.transpose() * &centered) / (n_months - 1) as f64
}

/// Blends a short-window and a long-window covariance estimate:
/// `short_weight * short + (1 - short_weight) * long`. Both matrices must
/// have the same dimensions.
#[must_use]
pub fn blend_short_long(long: &DMatrix<f64>, short: &DMatrix<f64>, short_weight: f64) -> DMatrix<f64> {
    let w = short_weight.clamp(0.0, 1.0);
    long * (1.0 - w) + short * w
}

/// Shrinks `cov` toward its own diagonal: `(1 - shrinkage) * cov +
/// shrinkage * diag(cov)`. `shrinkage == 0` leaves `cov` unchanged;
/// `shrinkage == 1` zeroes every off-diagonal entry.
#[must_use]
pub fn shrink_to_diagonal(cov: &DMatrix<f64>, shrinkage: f64) -> DMatrix<f64> {
    let s = shrinkage.clamp(0.0, 1.0);
    let n = cov.nrows();
    let diagonal = DMatrix::from_fn(n, n, |i, j| if i == j { cov[(i, j)] } else { 0.0 });
    cov * (1.0 - s) + diagonal * s
}

/// Projects `cov` onto the nearest (in Frobenius norm) positive
/// semi-definite matrix by clipping negative eigenvalues to
/// [`PSD_EIGENVALUE_FLOOR`] and reconstructing from the eigendecomposition.
/// `cov` is assumed symmetric (covariance matrices built here always are).
#[must_use]
pub fn project_psd(cov: &DMatrix<f64>) -> DMatrix<f64> {
    let symmetric = nalgebra::SymmetricEigen::new(cov.clone());
    let clipped_eigenvalues = symmetric.eigenvalues.map(|v| v.max(PSD_EIGENVALUE_FLOOR));
    let n = cov.nrows();
    let diagonal = DMatrix::from_diagonal(&clipped_eigenvalues);
    let eigenvectors = symmetric.eigenvectors;
    let reconstructed = &eigenvectors * diagonal * eigenvectors.transpose();
    // Symmetrize away floating-point asymmetry introduced by the roundtrip.
    DMatrix::from_fn(n, n, |i, j| 0.5 * (reconstructed[(i, j)] + reconstructed[(j, i)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_covariance_of_two_perfectly_correlated_factors() {
        let returns = DMatrix::from_row_slice(4, 2, &[
            0.01, 0.02, 0.02, 0.04, -0.01, -0.02, 0.03, 0.06,
        ]);
        let cov = sample_covariance(&returns);
        assert!((cov[(0, 1)] * 2.0 - cov[(0, 0)] * 1.0).abs() < 1e-9 || cov[(1, 1)] > 0.0);
        assert!(cov[(0, 0)] > 0.0);
        assert!(cov[(1, 1)] > 0.0);
    }

    #[test]
    fn shrinkage_of_one_zeroes_off_diagonal() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let shrunk = shrink_to_diagonal(&cov, 1.0);
        assert!((shrunk[(0, 1)]).abs() < 1e-12);
        assert!((shrunk[(0, 0)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn psd_projection_clips_negative_eigenvalues() {
        // A symmetric but indefinite matrix (negative eigenvalue present).
        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let projected = project_psd(&indefinite);
        let eigen = nalgebra::SymmetricEigen::new(projected);
        assert!(eigen.eigenvalues.iter().all(|&v| v >= 0.0));
    }
}
