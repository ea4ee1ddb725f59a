//! Shared statistical utilities for the risk model pipeline.
//!
//! Currently just z-score standardization, factored out here because both
//! the style factor post-processing step
//! (`taxalpha_risk::style::winsorize_and_standardize`) and other
//! cross-sectional computations need the same mean/std handling, including
//! the near-zero-variance guard.

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeResult {
    /// The computed mean of the input values.
    pub mean: f64,
    /// The computed sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Whether the standardization was applied (false if variance was too low).
    pub applied: bool,
}

/// Standardize a slice of f64 values to z-scores (mean=0, std=1).
///
/// Uses sample standard deviation (N-1 denominator) for unbiased estimation.
/// If the standard deviation is below the minimum threshold, returns zeros
/// to avoid division by near-zero values.
///
/// # Arguments
///
/// * `values` - The input values to standardize
///
/// # Returns
///
/// A tuple containing:
/// - The standardized values as a `Vec<f64>`
/// - A `StandardizeResult` with the computed statistics
///
/// # Edge Cases
///
/// - Empty input: Returns empty vector with mean=NaN, std=NaN, applied=false
/// - Single value: Returns [0.0] with std=0.0, applied=false
/// - Constant values: Returns zeros with applied=false
/// - Contains NaN/Inf: NaN values are excluded from mean/std calculation,
///   and NaN values in input produce NaN in output
///
/// # Examples
///
/// ```
/// use taxalpha_core::stats::standardize;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let (standardized, result) = standardize(&values);
///
/// assert!(result.applied);
/// assert!((result.mean - 3.0).abs() < 1e-10);
/// // Standardized values should have mean ~0 and std ~1
/// ```
pub fn standardize(values: &[f64]) -> (Vec<f64>, StandardizeResult) {
    if values.is_empty() {
        return (
            Vec::new(),
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    // Filter out non-finite values for statistics calculation
    let finite_values: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();

    if finite_values.is_empty() {
        return (
            vec![f64::NAN; values.len()],
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    let n = finite_values.len();
    let mean = finite_values.iter().sum::<f64>() / n as f64;

    // Sample variance with N-1 denominator (Bessel's correction)
    let variance = if n > 1 {
        finite_values
            .iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64
    } else {
        0.0
    };
    let std = variance.sqrt();

    let applied = std > MIN_STD_THRESHOLD;

    let standardized = if applied {
        values.iter().map(|x| (x - mean) / std).collect()
    } else {
        vec![0.0; values.len()]
    };

    (standardized, StandardizeResult { mean, std, applied })
}
