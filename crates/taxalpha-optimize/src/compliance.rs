//! Post-solve compliance checks: independent verification that a QP
//! solution actually respects the constraints it was supposed to, since
//! the projected-subgradient solve enforces some of them only
//! approximately (see [`crate::qp`]).

use nalgebra::DVector;

use crate::qp::SectorConstraint;

/// Tolerance for the "weights sum to 1" and "weights are non-negative" checks.
pub const WEIGHT_TOLERANCE: f64 = 1.0e-6;
/// Tolerance for turnover/sector-cap breaches.
pub const CONSTRAINT_TOLERANCE: f64 = 1.0e-6;

/// One sector's pass/fail result.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorCheck {
    /// Sector label.
    pub sector: String,
    /// Combined weight held.
    pub weight: f64,
    /// Configured cap.
    pub max_weight: f64,
    /// Whether `weight <= max_weight` within tolerance.
    pub passed: bool,
}

/// Full compliance report for one proposed set of weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceReport {
    /// `Σw ≈ 1`.
    pub fully_invested: bool,
    /// `w_i >= 0` for every security.
    pub long_only: bool,
    /// `Σ|w - w_current| <= turnover_limit`.
    pub turnover_within_limit: bool,
    /// Per-sector cap results.
    pub sector_checks: Vec<SectorCheck>,
    /// No wash-sale-restricted security was bought above its current weight.
    pub wash_sale_safe: bool,
    /// Whether every check above passed.
    pub passed: bool,
}

/// Runs every compliance check against `weights`.
#[must_use]
pub fn check(
    weights: &DVector<f64>,
    w_current: &DVector<f64>,
    turnover_limit: f64,
    sector_constraints: &[SectorConstraint],
    wash_sale_restricted: &[bool],
) -> ComplianceReport {
    let fully_invested = (weights.sum() - 1.0).abs() <= WEIGHT_TOLERANCE;
    let long_only = weights.iter().all(|&w| w >= -WEIGHT_TOLERANCE);

    let turnover: f64 = (weights - w_current).iter().map(|x| x.abs()).sum();
    let turnover_within_limit = turnover <= turnover_limit + CONSTRAINT_TOLERANCE;

    let sector_checks: Vec<SectorCheck> = sector_constraints
        .iter()
        .map(|sector| {
            let weight: f64 = sector.members.iter().map(|&i| weights[i]).sum();
            SectorCheck {
                sector: sector.sector.clone(),
                weight,
                max_weight: sector.max_weight,
                passed: weight <= sector.max_weight + CONSTRAINT_TOLERANCE,
            }
        })
        .collect();

    let wash_sale_safe = (0..weights.len())
        .filter(|&i| wash_sale_restricted.get(i).copied().unwrap_or(false))
        .all(|i| weights[i] <= w_current[i] + CONSTRAINT_TOLERANCE);

    let passed = fully_invested
        && long_only
        && turnover_within_limit
        && sector_checks.iter().all(|s| s.passed)
        && wash_sale_safe;

    ComplianceReport {
        fully_invested,
        long_only,
        turnover_within_limit,
        sector_checks,
        wash_sale_safe,
        passed,
    }
}
