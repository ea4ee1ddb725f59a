//! Deciding whether to rebalance, and orchestrating the full
//! risk-matrix → QP solve → trade generation → compliance pipeline when
//! one is warranted.

use std::collections::HashMap;

use chrono::NaiveDate;
use taxalpha_core::{
    Config, Exposure, FactorCovariance, RebalancingEvent, RebalancingEventId, RebalancingStatus,
    SecurityId, SpecificVariance, TaxLot,
};
use taxalpha_harvest::LotSelector;

use crate::compliance::{self, ComplianceReport};
use crate::error::{OptimizeError, Result};
use crate::qp::{self, QpInputs, SectorConstraint};
use crate::risk_matrix;

/// Why a rebalance was (or wasn't) triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceReason {
    /// Tracking error exceeded [`Config::tracking_error_threshold`].
    TrackingErrorBreach,
    /// [`Config::scheduled_rebalance_days`] elapsed since the last rebalance.
    ScheduledInterval,
    /// Neither condition was met.
    NotNeeded,
}

/// The decision of whether to run a rebalance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalanceDecision {
    /// Whether a rebalance should run.
    pub should_rebalance: bool,
    /// Why.
    pub reason: RebalanceReason,
}

/// Decides whether an account should be rebalanced today, given its
/// current tracking error and how long it has been since the last
/// rebalance.
#[must_use]
pub fn decide(tracking_error_before: f64, days_since_last_rebalance: i64, config: &Config) -> RebalanceDecision {
    if tracking_error_before > config.tracking_error_threshold {
        return RebalanceDecision {
            should_rebalance: true,
            reason: RebalanceReason::TrackingErrorBreach,
        };
    }
    if days_since_last_rebalance >= config.scheduled_rebalance_days {
        return RebalanceDecision {
            should_rebalance: true,
            reason: RebalanceReason::ScheduledInterval,
        };
    }
    RebalanceDecision {
        should_rebalance: false,
        reason: RebalanceReason::NotNeeded,
    }
}

/// Input bundle for [`run`], gathering everything the pipeline needs for
/// one account on one rebalance date.
pub struct RebalanceRequest<'a> {
    /// Identifier assigned to the resulting [`RebalancingEvent`].
    pub event_id: RebalancingEventId,
    /// Account being rebalanced.
    pub account_id: taxalpha_core::AccountId,
    /// Rebalance date.
    pub rebalance_date: NaiveDate,
    /// Optimization universe.
    pub securities: Vec<SecurityId>,
    /// Current portfolio weights, aligned to `securities`.
    pub w_current: nalgebra::DVector<f64>,
    /// Benchmark weights, aligned to `securities`.
    pub w_benchmark: nalgebra::DVector<f64>,
    /// Risk model exposures for the universe's month-end.
    pub exposures: &'a [Exposure],
    /// Factor covariance for the universe's month-end.
    pub factor_covariance: &'a [FactorCovariance],
    /// Specific variance for the universe's month-end.
    pub specific_variance: &'a [SpecificVariance],
    /// Per-security tax benefit per unit sold.
    pub tax_coefficients: nalgebra::DVector<f64>,
    /// Per-security embedded-gain penalty per unit sold.
    pub gain_penalties: nalgebra::DVector<f64>,
    /// Securities that cannot be bought above their current weight.
    pub wash_sale_restricted: Vec<bool>,
    /// Sector exposure caps.
    pub sector_constraints: Vec<SectorConstraint>,
    /// Current total portfolio value, for sizing trades.
    pub portfolio_value: f64,
    /// Current prices, keyed by security.
    pub prices: HashMap<SecurityId, f64>,
    /// Open tax lots, keyed by security.
    pub open_lots: HashMap<SecurityId, Vec<TaxLot>>,
    /// Lot selection strategy for sells.
    pub sell_selector: &'a dyn LotSelector,
}

/// Runs the full pipeline and returns the resulting event plus its
/// compliance report. The event's status is [`RebalancingStatus::Pending`]
/// on success (execution against an account store is the caller's job)
/// or [`RebalancingStatus::Failed`] if the solve did not converge.
///
/// # Errors
///
/// Propagates [`risk_matrix::build`] and [`crate::trade_generator::generate_trades`] errors.
pub fn run(request: RebalanceRequest<'_>, config: &Config) -> Result<(RebalancingEvent, ComplianceReport)> {
    let risk = risk_matrix::build(
        &request.securities,
        request.exposures,
        request.factor_covariance,
        request.specific_variance,
    )?;

    let tracking_error_before = {
        let active = &request.w_current - &request.w_benchmark;
        let factor_exposure = risk.exposures.transpose() * &active;
        let factor_risk = (factor_exposure.transpose() * &risk.factor_covariance * &factor_exposure)[(0, 0)];
        let specific_risk: f64 = (0..active.len())
            .map(|i| risk.specific_variance[i] * active[i] * active[i])
            .sum();
        (factor_risk + specific_risk).max(0.0).sqrt()
    };

    let inputs = QpInputs {
        risk: &risk,
        w_current: request.w_current.clone(),
        w_benchmark: request.w_benchmark.clone(),
        tax_coefficients: request.tax_coefficients,
        gain_penalties: request.gain_penalties,
        wash_sale_restricted: request.wash_sale_restricted.clone(),
        sector_constraints: request.sector_constraints.clone(),
        turnover_limit: config.turnover_limit,
        max_tracking_error: Some(config.tracking_error_threshold),
        lambda_transaction: config.lambda_transaction,
        lambda_tax: config.lambda_tax,
        lambda_gain: config.lambda_gain,
        transaction_cost_rate: config.transaction_cost_rate,
    };

    let solve = qp::solve(&inputs);
    if !solve.converged {
        return Err(OptimizeError::DidNotConverge {
            iterations: solve.iterations,
        });
    }

    let report = compliance::check(
        &solve.weights,
        &request.w_current,
        config.turnover_limit,
        &inputs.sector_constraints,
        &inputs.wash_sale_restricted,
    );

    let status = if report.passed {
        RebalancingStatus::Pending
    } else {
        RebalancingStatus::Failed
    };

    let trades = if report.passed {
        crate::trade_generator::generate_trades(
            request.event_id,
            &request.securities,
            &solve,
            request.portfolio_value,
            &request.prices,
            &request.open_lots,
            request.sell_selector,
        )?
    } else {
        Vec::new()
    };

    let event = RebalancingEvent {
        id: request.event_id,
        account_id: request.account_id,
        rebalance_date: request.rebalance_date,
        tracking_error_before,
        tracking_error_after: Some(solve.tracking_error),
        estimated_tax_benefit: solve.tax_benefit,
        realized_tax_benefit: None,
        status,
        trades,
    };

    Ok((event, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn tracking_error_breach_forces_a_rebalance() {
        let decision = decide(0.05, 0, &config());
        assert!(decision.should_rebalance);
        assert_eq!(decision.reason, RebalanceReason::TrackingErrorBreach);
    }

    #[test]
    fn scheduled_interval_forces_a_rebalance() {
        let decision = decide(0.001, 999, &config());
        assert!(decision.should_rebalance);
        assert_eq!(decision.reason, RebalanceReason::ScheduledInterval);
    }

    #[test]
    fn otherwise_no_rebalance_is_needed() {
        let decision = decide(0.001, 0, &config());
        assert!(!decision.should_rebalance);
        assert_eq!(decision.reason, RebalanceReason::NotNeeded);
    }
}
