//! Shared risk-model history building, used by both `risk-build` and the
//! commands that need a risk model as an input (`rebalance`, `pipeline`).

use std::collections::HashMap;

use anyhow::{ensure, Context as _, Result};
use chrono::NaiveDate;
use nalgebra::DMatrix;

use std::collections::HashSet;

use taxalpha::core::factor::style_names;
use taxalpha::core::{Config, Factor, FactorCovariance, SecurityId};
use taxalpha::harvest::wash_sale::extend_to_substantially_identical;
use taxalpha::harvest::OpportunityFinder;
use taxalpha::risk::{CrossSectionOutput, RiskModelBuilder, RiskPanel};

use crate::scenario::Scenario;

/// A deterministic rebalancing event id derived from the rebalance date:
/// days since the epoch, which is stable across runs for the same date
/// and fits comfortably in a `u64`.
pub fn event_id_for(date: NaiveDate) -> u64 {
    date.signed_duration_since(NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date"))
        .num_days()
        .max(0) as u64
}

/// Risk model output for every month-end up to and including the target
/// date, plus a factor covariance matrix estimated from the accumulated
/// style-factor return history.
///
/// The covariance history tracks only the ten canonical style factors:
/// industry/country membership can change month to month, so they don't
/// form a stable common column set across an arbitrary history window.
pub struct RiskHistory {
    /// One cross-section per month-end, ascending.
    pub cross_sections: Vec<(NaiveDate, CrossSectionOutput)>,
    /// Factor covariance for the target month-end.
    pub factor_covariance: Vec<FactorCovariance>,
}

impl RiskHistory {
    /// The cross-section for the target (most recent) month-end.
    pub fn latest(&self) -> &CrossSectionOutput {
        &self
            .cross_sections
            .last()
            .expect("build_risk_history always returns at least one cross-section")
            .1
    }
}

/// Builds a [`RiskHistory`] from `panel` for every month-end at or before
/// `month_end`, threading the specific-variance EWMA across months.
pub fn build_risk_history(panel: &RiskPanel, config: &Config, month_end: NaiveDate) -> Result<RiskHistory> {
    let builder = RiskModelBuilder;
    let month_ends: Vec<NaiveDate> = panel
        .month_ends()
        .into_iter()
        .filter(|d| *d <= month_end)
        .collect();
    ensure!(!month_ends.is_empty(), "no panel observations at or before {month_end}");

    let factor_order: Vec<Factor> = style_names::CANONICAL
        .iter()
        .map(|name| Factor::Style((*name).to_string()))
        .collect();

    let mut prior_specific_ewma: HashMap<SecurityId, f64> = HashMap::new();
    let mut cross_sections = Vec::with_capacity(month_ends.len());
    let mut style_return_history: Vec<f64> = Vec::with_capacity(month_ends.len() * factor_order.len());

    for date in month_ends {
        let output = builder
            .build_cross_section(panel, config, date, date, &prior_specific_ewma)
            .with_context(|| format!("building risk model cross-section for {date}"))?;

        prior_specific_ewma = output
            .specific_variances
            .iter()
            .map(|v| (v.security_id, v.ewma))
            .collect();

        let returns_by_factor: HashMap<&Factor, f64> = output
            .factor_returns
            .iter()
            .map(|r| (&r.factor, r.factor_return))
            .collect();
        style_return_history.extend(
            factor_order
                .iter()
                .map(|factor| returns_by_factor.get(factor).copied().unwrap_or(0.0)),
        );

        cross_sections.push((date, output));
    }

    let history = DMatrix::from_row_slice(cross_sections.len(), factor_order.len(), &style_return_history);
    let factor_covariance = RiskModelBuilder::build_factor_covariance(config, month_end, &factor_order, &history);

    Ok(RiskHistory {
        cross_sections,
        factor_covariance,
    })
}

/// Per-security tax inputs to the optimizer, aligned to `universe`:
/// per-unit tax benefit of selling (from harvestable lots), per-unit
/// embedded-gain penalty (from lots with an unrealized gain), and whether
/// a sale today would be wash-sale restricted.
pub struct TaxInputs {
    /// Tax benefit per unit sold, aligned to `universe`.
    pub tax_coefficients: Vec<f64>,
    /// Embedded-gain penalty per unit sold, aligned to `universe`.
    pub gain_penalties: Vec<f64>,
    /// Whether each security is wash-sale restricted today.
    pub wash_sale_restricted: Vec<bool>,
}

/// Derives [`TaxInputs`] from the scenario's open lots and the harvesting
/// engine's own opportunity scoring, so the optimizer sees the same
/// tax-benefit estimates the harvesting report surfaces.
pub fn tax_inputs(scenario: &Scenario, universe: &[SecurityId], as_of: NaiveDate, config: &Config) -> TaxInputs {
    let finder = OpportunityFinder::new(
        config.min_tax_loss_threshold,
        config.wash_sale_window_days,
        config.long_term_holding_days,
    );
    let securities = scenario.securities_by_id();
    let candidates = scenario.candidate_securities();
    let opportunities = finder.find_opportunities(
        &scenario.lots,
        &scenario.prices,
        as_of,
        &scenario.account,
        &scenario.transactions,
        &securities,
        &candidates,
        &scenario.returns_by_security,
    );

    let mut tax_benefit_by_security: HashMap<SecurityId, f64> = HashMap::new();
    let mut wash_sale_by_security: HashMap<SecurityId, bool> = HashMap::new();
    for opp in &opportunities {
        *tax_benefit_by_security.entry(opp.security_id).or_insert(0.0) += opp.base_tax_benefit;
        if opp.is_wash_sale {
            wash_sale_by_security.insert(opp.security_id, true);
        }
    }

    let tax_coefficients = universe
        .iter()
        .map(|id| {
            let quantity: f64 = scenario
                .lots
                .iter()
                .filter(|l| l.security_id == *id)
                .map(|l| l.remaining_quantity)
                .sum();
            if quantity <= 1e-9 {
                0.0
            } else {
                tax_benefit_by_security.get(id).copied().unwrap_or(0.0) / quantity
            }
        })
        .collect();

    let gain_penalties = universe
        .iter()
        .map(|id| {
            let price = scenario.prices.get(id).copied().unwrap_or(0.0);
            let lots: Vec<_> = scenario.lots.iter().filter(|l| l.security_id == *id).collect();
            let quantity: f64 = lots.iter().map(|l| l.remaining_quantity).sum();
            if quantity <= 1e-9 {
                return 0.0;
            }
            let gain_per_unit: f64 = lots
                .iter()
                .map(|l| l.unrealized_gain_loss(price))
                .sum::<f64>()
                / quantity;
            if gain_per_unit <= 0.0 {
                return 0.0;
            }
            let is_long_term = lots
                .iter()
                .all(|l| l.is_long_term(as_of, config.long_term_holding_days));
            gain_per_unit * scenario.account.marginal_rate(is_long_term)
        })
        .collect();

    let directly_restricted: HashSet<SecurityId> = wash_sale_by_security
        .iter()
        .filter(|(_, &restricted)| restricted)
        .map(|(id, _)| *id)
        .collect();
    let fully_restricted =
        extend_to_substantially_identical(&directly_restricted, universe, &scenario.returns_by_security);

    let wash_sale_restricted = universe.iter().map(|id| fully_restricted.contains(id)).collect();

    TaxInputs {
        tax_coefficients,
        gain_penalties,
        wash_sale_restricted,
    }
}
