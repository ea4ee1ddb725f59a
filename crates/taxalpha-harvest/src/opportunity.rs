//! Harvest opportunity discovery and scoring.
//!
//! Ties together [`crate::wash_sale`], [`crate::replacement`], and
//! [`crate::tax_benefit`] into one ranked list: for every open lot with an
//! unrealized loss past `min_tax_loss_threshold`, estimate its tax
//! benefit, check whether selling it today would be a wash sale, look for
//! replacement securities, and combine all three into a single score.

use std::collections::HashMap;

use chrono::NaiveDate;

use taxalpha_core::{Account, LotId, Security, SecurityId, TaxLot, Transaction};

use crate::replacement::{average_top_n_similarity, find_replacements, ReplacementCandidate};
use crate::tax_benefit::estimated_tax_benefit;
use crate::wash_sale::violates_wash_sale;

/// Multiplier applied to the base tax benefit when selling today would be
/// a wash sale (the loss is still real, but deferred, so it is worth less
/// right now).
pub const WASH_SALE_PENALTY: f64 = 0.5;
/// Bonus-per-unit-of-average-top-3-similarity applied when replacements exist.
pub const REPLACEMENT_BONUS_RATE: f64 = 0.2;
/// Multiplier applied when no viable replacement exists at all.
pub const NO_REPLACEMENT_PENALTY: f64 = 0.7;
/// How many top-ranked replacement candidates feed the similarity bonus.
pub const TOP_N_REPLACEMENTS: usize = 3;
/// Scaling applied after normalizing per dollar of loss, purely to keep
/// scores in a human-legible range.
pub const SCORE_SCALE: f64 = 1000.0;

/// One scored tax-loss-harvesting opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestOpportunity {
    /// The lot this opportunity would sell.
    pub lot_id: LotId,
    /// Security the lot holds.
    pub security_id: SecurityId,
    /// Estimated dollar tax benefit before wash-sale/replacement adjustments.
    pub base_tax_benefit: f64,
    /// Whether selling today would be a wash sale.
    pub is_wash_sale: bool,
    /// Ranked replacement candidates, if any.
    pub replacements: Vec<ReplacementCandidate>,
    /// Final opportunity score (higher is better), normalized per $1,000
    /// of unrealized loss.
    pub score: f64,
}

/// Finds and ranks harvest opportunities across a set of open lots.
#[derive(Debug, Clone, Copy)]
pub struct OpportunityFinder {
    /// Minimum `|unrealized_loss|` for a lot to be considered.
    pub min_tax_loss_threshold: f64,
    /// Wash-sale window, in days on each side of the sale.
    pub wash_sale_window_days: i64,
    /// Minimum holding period, in days, to qualify for the long-term rate.
    pub long_term_holding_days: i64,
}

impl OpportunityFinder {
    /// Builds an `OpportunityFinder` from the relevant configuration values.
    #[must_use]
    pub const fn new(
        min_tax_loss_threshold: f64,
        wash_sale_window_days: i64,
        long_term_holding_days: i64,
    ) -> Self {
        Self {
            min_tax_loss_threshold,
            wash_sale_window_days,
            long_term_holding_days,
        }
    }

    /// Scores every open lot in `lots` that holds an unrealized loss past
    /// `min_tax_loss_threshold`, sorted descending by score (ties broken
    /// by security id for determinism).
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn find_opportunities(
        &self,
        lots: &[TaxLot],
        current_prices: &HashMap<SecurityId, f64>,
        as_of: NaiveDate,
        account: &Account,
        household_transactions: &[Transaction],
        securities: &HashMap<SecurityId, Security>,
        candidate_pool: &[Security],
        returns_by_security: &HashMap<SecurityId, Vec<f64>>,
    ) -> Vec<HarvestOpportunity> {
        let mut opportunities: Vec<HarvestOpportunity> = lots
            .iter()
            .filter_map(|lot| {
                let current_price = *current_prices.get(&lot.security_id)?;
                let unrealized = lot.unrealized_gain_loss(current_price);
                if unrealized >= 0.0 || -unrealized < self.min_tax_loss_threshold {
                    return None;
                }

                let base_tax_benefit = estimated_tax_benefit(
                    lot,
                    current_price,
                    as_of,
                    self.long_term_holding_days,
                    account,
                );
                let is_wash_sale = violates_wash_sale(
                    lot.security_id,
                    as_of,
                    household_transactions,
                    self.wash_sale_window_days,
                );

                let replacements = securities
                    .get(&lot.security_id)
                    .map(|target| find_replacements(target, candidate_pool, returns_by_security))
                    .unwrap_or_default();

                let score = self.score(base_tax_benefit, is_wash_sale, &replacements, -unrealized);

                Some(HarvestOpportunity {
                    lot_id: lot.id,
                    security_id: lot.security_id,
                    base_tax_benefit,
                    is_wash_sale,
                    replacements,
                    score,
                })
            })
            .collect();

        opportunities.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then_with(|| a.security_id.cmp(&b.security_id))
        });

        tracing::info!(
            as_of = %as_of,
            lots_scanned = lots.len(),
            opportunities_found = opportunities.len(),
            "harvest scan complete"
        );
        opportunities
    }

    /// Combines the base tax benefit, the wash-sale penalty, and the
    /// replacement-availability adjustment into one per-dollar-of-loss
    /// score.
    fn score(
        &self,
        base_tax_benefit: f64,
        is_wash_sale: bool,
        replacements: &[ReplacementCandidate],
        loss_amount: f64,
    ) -> f64 {
        let mut value = base_tax_benefit;
        if is_wash_sale {
            value *= WASH_SALE_PENALTY;
        }
        if replacements.is_empty() {
            value *= NO_REPLACEMENT_PENALTY;
        } else {
            let avg_similarity = average_top_n_similarity(replacements, TOP_N_REPLACEMENTS);
            value *= 1.0 + REPLACEMENT_BONUS_RATE * avg_similarity;
        }
        if loss_amount.abs() < 1e-9 {
            return 0.0;
        }
        value / loss_amount * SCORE_SCALE
    }
}
