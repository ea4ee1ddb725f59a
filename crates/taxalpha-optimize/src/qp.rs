//! The core portfolio optimization solve.
//!
//! Minimizes tracking-error risk plus a transaction-cost penalty, minus a
//! tax-benefit reward and a gain-deferral penalty, subject to being fully
//! invested and long-only. No convex QP solver is available in this
//! dependency stack, so the solve is a projected subgradient method: each
//! step takes a gradient step on the smooth risk term (the non-smooth
//! transaction-cost/tax/gain terms use a subgradient) and projects back
//! onto the feasible set — the capped simplex `{w : sum(w) = 1, lo <= w <=
//! hi}` — via bisection on the simplex's Lagrange multiplier. Turnover and
//! sector limits are not part of that feasible set; they are enforced by
//! an active-set style correction after the unconstrained-box solve
//! converges, which tightens the relevant upper bounds and re-solves.

use nalgebra::DVector;

use crate::risk_matrix::RiskMatrices;

const MAX_ITERS: usize = 500;
const ACTIVE_SET_PASSES: usize = 4;
const REFINEMENT_ITERS: usize = 100;
const CONVERGENCE_TOL: f64 = 1.0e-8;
const BISECTION_ITERS: usize = 100;
const BASE_STEP: f64 = 0.5;

/// One sector's membership and the maximum combined weight its members
/// may hold.
#[derive(Debug, Clone)]
pub struct SectorConstraint {
    /// Sector label, for diagnostics.
    pub sector: String,
    /// Indices (into the optimization universe) of securities in this sector.
    pub members: Vec<usize>,
    /// Maximum combined weight.
    pub max_weight: f64,
}

/// Everything the QP solve needs, densified to the same security
/// ordering as `risk.securities`.
#[derive(Debug, Clone)]
pub struct QpInputs<'a> {
    /// Risk model matrices for the optimization universe.
    pub risk: &'a RiskMatrices,
    /// Current portfolio weights.
    pub w_current: DVector<f64>,
    /// Benchmark weights tracking error is measured against.
    pub w_benchmark: DVector<f64>,
    /// Per-security tax benefit per unit sold (zero for non-loss lots).
    pub tax_coefficients: DVector<f64>,
    /// Per-security embedded-gain penalty per unit sold.
    pub gain_penalties: DVector<f64>,
    /// Securities that cannot be bought above their current weight
    /// (wash-sale restricted).
    pub wash_sale_restricted: Vec<bool>,
    /// Sector exposure caps.
    pub sector_constraints: Vec<SectorConstraint>,
    /// Maximum `Σ|w - w_current|`.
    pub turnover_limit: f64,
    /// Hard cap on tracking error (portfolio active-risk standard
    /// deviation), applied as a post-solve rescale toward the benchmark.
    pub max_tracking_error: Option<f64>,
    /// Transaction-cost weight in the objective.
    pub lambda_transaction: f64,
    /// Tax-benefit weight in the objective.
    pub lambda_tax: f64,
    /// Gain-deferral-penalty weight in the objective.
    pub lambda_gain: f64,
    /// Assumed per-dollar transaction cost rate.
    pub transaction_cost_rate: f64,
}

/// Result of a QP solve.
#[derive(Debug, Clone)]
pub struct SolveOutput {
    /// Optimal portfolio weights.
    pub weights: DVector<f64>,
    /// `weights - w_current`.
    pub trades: DVector<f64>,
    /// `sqrt` of the active-risk variance at the solution.
    pub tracking_error: f64,
    /// Total estimated tax benefit realized by the sells in `trades`.
    pub tax_benefit: f64,
    /// Iterations run in the main projected-subgradient loop.
    pub iterations: usize,
    /// Whether the main loop's step-size fell below [`CONVERGENCE_TOL`]
    /// before exhausting [`MAX_ITERS`].
    pub converged: bool,
}

/// Runs the solve described in the module documentation.
#[must_use]
pub fn solve(inputs: &QpInputs<'_>) -> SolveOutput {
    let n = inputs.risk.securities.len();
    let lo = DVector::<f64>::zeros(n);
    let mut hi = DVector::<f64>::from_iterator(
        n,
        (0..n).map(|i| {
            if inputs.wash_sale_restricted.get(i).copied().unwrap_or(false) {
                inputs.w_current[i]
            } else {
                1.0
            }
        }),
    );

    let (mut w, mut iterations, mut converged) =
        projected_subgradient(inputs, &lo, &hi, inputs.w_current.clone(), MAX_ITERS);

    for _ in 0..ACTIVE_SET_PASSES {
        let mut adjusted = false;

        for sector in &inputs.sector_constraints {
            let sector_sum: f64 = sector.members.iter().map(|&i| w[i]).sum();
            if sector_sum > sector.max_weight + 1e-9 {
                let scale = sector.max_weight / sector_sum;
                for &i in &sector.members {
                    let tightened = (w[i] * scale).max(lo[i]);
                    if tightened < hi[i] {
                        hi[i] = tightened;
                        adjusted = true;
                    }
                }
            }
        }

        let turnover: f64 = (&w - &inputs.w_current).iter().map(|x| x.abs()).sum();
        let start = if turnover > inputs.turnover_limit + 1e-9 {
            adjusted = true;
            let scale = inputs.turnover_limit / turnover;
            project_capped_simplex(
                &(&inputs.w_current + scale * (&w - &inputs.w_current)),
                &lo,
                &hi,
                1.0,
            )
        } else {
            w.clone()
        };

        if !adjusted {
            break;
        }

        let (refined, refined_iters, refined_converged) =
            projected_subgradient(inputs, &lo, &hi, start, REFINEMENT_ITERS);
        w = refined;
        iterations += refined_iters;
        converged = refined_converged;
    }

    if let Some(cap) = inputs.max_tracking_error {
        let te = tracking_error(inputs, &w);
        if te > cap && te > 1e-12 {
            let scale = cap / te;
            let shrunk = &inputs.w_benchmark + scale * (&w - &inputs.w_benchmark);
            let sum = shrunk.sum();
            w = if sum.abs() > 1e-12 { shrunk / sum } else { shrunk };
        }
    }

    let trades = &w - &inputs.w_current;
    let tax_benefit = (0..n)
        .map(|i| inputs.tax_coefficients[i] * (inputs.w_current[i] - w[i]).max(0.0))
        .sum();

    if !converged {
        tracing::warn!(iterations, "qp solve did not converge within the iteration budget");
    }
    tracing::info!(
        n_securities = n,
        iterations,
        converged,
        tracking_error = tracking_error(inputs, &w),
        "qp solve complete"
    );

    SolveOutput {
        tracking_error: tracking_error(inputs, &w),
        tax_benefit,
        weights: w,
        trades,
        iterations,
        converged,
    }
}

fn projected_subgradient(
    inputs: &QpInputs<'_>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    start: DVector<f64>,
    max_iters: usize,
) -> (DVector<f64>, usize, bool) {
    let mut w = project_capped_simplex(&start, lo, hi, 1.0);
    let mut best_w = w.clone();
    let mut best_obj = objective(inputs, &w);
    let mut converged = false;
    let mut last_iter = 0;

    for iter in 0..max_iters {
        last_iter = iter + 1;
        let grad = gradient(inputs, &w);
        let step = BASE_STEP / ((iter as f64) + 1.0).sqrt();
        let candidate = &w - step * grad;
        let next = project_capped_simplex(&candidate, lo, hi, 1.0);
        let delta = (&next - &w).norm();
        w = next;

        let obj = objective(inputs, &w);
        if obj < best_obj {
            best_obj = obj;
            best_w = w.clone();
        }
        if delta < CONVERGENCE_TOL {
            converged = true;
            break;
        }
    }

    (best_w, last_iter, converged)
}

fn tracking_error(inputs: &QpInputs<'_>, w: &DVector<f64>) -> f64 {
    risk_term(inputs, w).max(0.0).sqrt()
}

fn risk_term(inputs: &QpInputs<'_>, w: &DVector<f64>) -> f64 {
    let active = w - &inputs.w_benchmark;
    let factor_exposure = inputs.risk.exposures.transpose() * &active;
    let factor_risk = (factor_exposure.transpose() * &inputs.risk.factor_covariance * &factor_exposure)[(0, 0)];
    let specific_risk: f64 = (0..active.len())
        .map(|i| inputs.risk.specific_variance[i] * active[i] * active[i])
        .sum();
    factor_risk + specific_risk
}

fn objective(inputs: &QpInputs<'_>, w: &DVector<f64>) -> f64 {
    let n = w.len();
    let trade_cost: f64 = (0..n).map(|i| (w[i] - inputs.w_current[i]).abs()).sum();
    let tax_benefit: f64 = (0..n)
        .map(|i| inputs.tax_coefficients[i] * (inputs.w_current[i] - w[i]).max(0.0))
        .sum();
    let gain_penalty: f64 = (0..n)
        .map(|i| inputs.gain_penalties[i] * (inputs.w_current[i] - w[i]).max(0.0))
        .sum();

    risk_term(inputs, w) + inputs.lambda_transaction * inputs.transaction_cost_rate * trade_cost
        - inputs.lambda_tax * tax_benefit
        + inputs.lambda_gain * gain_penalty
}

fn gradient(inputs: &QpInputs<'_>, w: &DVector<f64>) -> DVector<f64> {
    let n = w.len();
    let active = w - &inputs.w_benchmark;
    let factor_exposure = inputs.risk.exposures.transpose() * &active;
    let factor_grad = &inputs.risk.exposures * (&inputs.risk.factor_covariance * factor_exposure);

    DVector::from_iterator(
        n,
        (0..n).map(|i| {
            let mut g = 2.0 * factor_grad[i] + 2.0 * inputs.risk.specific_variance[i] * active[i];

            let trade = w[i] - inputs.w_current[i];
            g += inputs.lambda_transaction * inputs.transaction_cost_rate * trade.signum();

            if trade < 0.0 {
                g += inputs.lambda_tax * inputs.tax_coefficients[i];
                g -= inputs.lambda_gain * inputs.gain_penalties[i];
            }

            g
        }),
    )
}

/// Projects `v` onto `{ w : sum(w) == target, lo <= w <= hi }` by
/// bisecting on the simplex's shared Lagrange multiplier `theta`, the
/// standard technique for projecting onto a capped simplex.
fn project_capped_simplex(v: &DVector<f64>, lo: &DVector<f64>, hi: &DVector<f64>, target: f64) -> DVector<f64> {
    let clipped_sum = |theta: f64| -> f64 {
        (0..v.len())
            .map(|i| (v[i] - theta).clamp(lo[i], hi[i]))
            .sum()
    };

    let mut theta_lo = (0..v.len())
        .map(|i| v[i] - hi[i])
        .fold(f64::INFINITY, f64::min)
        - 1.0;
    let mut theta_hi = (0..v.len())
        .map(|i| v[i] - lo[i])
        .fold(f64::NEG_INFINITY, f64::max)
        + 1.0;

    for _ in 0..BISECTION_ITERS {
        let mid = 0.5 * (theta_lo + theta_hi);
        if clipped_sum(mid) > target {
            theta_lo = mid;
        } else {
            theta_hi = mid;
        }
    }

    let theta = 0.5 * (theta_lo + theta_hi);
    DVector::from_iterator(v.len(), (0..v.len()).map(|i| (v[i] - theta).clamp(lo[i], hi[i])))
}
