//! Scenario fixture loading for the taxalpha CLI.
//!
//! The production system reads its risk panel and account state from the
//! analytics/account stores; for a standalone CLI run, a single JSON
//! fixture bundles everything one invocation needs. Every field maps
//! directly onto an already-`Serialize`/`Deserialize` domain type, so the
//! fixture format is just "the CLI's input tables as one file" rather
//! than a format of its own.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use taxalpha::core::{Account, Position, Security, SecurityId, TaxLot, Transaction};
use taxalpha::risk::MonthlyRecord;

/// Everything one `risk-build`/`harvest`/`rebalance`/`pipeline` run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Monthly risk-model panel, every security and month-end it has an
    /// observation for.
    pub panel: Vec<MonthlyRecord>,
    /// The account being harvested/rebalanced.
    pub account: Account,
    /// Current positions for `account`.
    pub positions: Vec<Position>,
    /// Open and closed tax lots for `account`.
    pub lots: Vec<TaxLot>,
    /// Transaction history for `account`'s household (wash-sale detection).
    pub transactions: Vec<Transaction>,
    /// Security master for every id referenced elsewhere in the scenario.
    pub securities: Vec<Security>,
    /// Ids (into `securities`) eligible as tax-loss-harvesting replacements.
    pub candidate_pool: Vec<SecurityId>,
    /// Trailing monthly return series per security, used for replacement
    /// similarity scoring.
    pub returns_by_security: HashMap<SecurityId, Vec<f64>>,
    /// Current prices, keyed by security.
    pub prices: HashMap<SecurityId, f64>,
    /// Benchmark weights the account is rebalanced against.
    pub benchmark_weights: HashMap<SecurityId, f64>,
}

impl Scenario {
    /// Loads a scenario from a JSON fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading scenario fixture {}", path.display()))?;
        let scenario: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing scenario fixture {}", path.display()))?;
        Ok(scenario)
    }

    /// Security master as a lookup map, keyed by id.
    #[must_use]
    pub fn securities_by_id(&self) -> HashMap<SecurityId, Security> {
        self.securities.iter().map(|s| (s.id, s.clone())).collect()
    }

    /// The candidate pool resolved to full `Security` values.
    #[must_use]
    pub fn candidate_securities(&self) -> Vec<Security> {
        let by_id = self.securities_by_id();
        self.candidate_pool
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect()
    }

    /// Portfolio weights implied by `positions` and `prices`, aligned to
    /// `universe`. Securities with no position are weighted zero.
    #[must_use]
    pub fn current_weights(&self, universe: &[SecurityId]) -> Vec<f64> {
        let market_value: HashMap<SecurityId, f64> = self
            .positions
            .iter()
            .map(|p| {
                let price = self.prices.get(&p.security_id).copied().unwrap_or(0.0);
                (p.security_id, p.quantity * price)
            })
            .collect();
        let total: f64 = market_value.values().sum();
        universe
            .iter()
            .map(|id| {
                if total.abs() < 1e-9 {
                    0.0
                } else {
                    market_value.get(id).copied().unwrap_or(0.0) / total
                }
            })
            .collect()
    }

    /// Benchmark weights aligned to `universe`, defaulting to zero for any
    /// security the fixture doesn't list.
    #[must_use]
    pub fn benchmark_weight_vec(&self, universe: &[SecurityId]) -> Vec<f64> {
        universe
            .iter()
            .map(|id| self.benchmark_weights.get(id).copied().unwrap_or(0.0))
            .collect()
    }

    /// Current total market value across `positions`.
    #[must_use]
    pub fn portfolio_value(&self) -> f64 {
        self.positions
            .iter()
            .map(|p| p.quantity * self.prices.get(&p.security_id).copied().unwrap_or(0.0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxalpha::core::{AccountId, HouseholdId};

    fn scenario() -> Scenario {
        let sec_a = SecurityId::from(1);
        let sec_b = SecurityId::from(2);
        Scenario {
            panel: vec![],
            account: Account {
                id: AccountId::from(1),
                short_term_rate: 0.37,
                long_term_rate: 0.20,
                benchmark_name: None,
                household_id: Some(HouseholdId::from(1)),
            },
            positions: vec![
                Position {
                    account_id: AccountId::from(1),
                    security_id: sec_a,
                    quantity: 100.0,
                },
                Position {
                    account_id: AccountId::from(1),
                    security_id: sec_b,
                    quantity: 50.0,
                },
            ],
            lots: vec![],
            transactions: vec![],
            securities: vec![],
            candidate_pool: vec![],
            returns_by_security: HashMap::new(),
            prices: HashMap::from([(sec_a, 10.0), (sec_b, 20.0)]),
            benchmark_weights: HashMap::from([(sec_a, 0.4), (sec_b, 0.6)]),
        }
    }

    #[test]
    fn current_weights_are_market_value_proportional() {
        let s = scenario();
        let universe = vec![SecurityId::from(1), SecurityId::from(2)];
        let weights = s.current_weights(&universe);
        // 100*10 = 1000, 50*20 = 1000; evenly split.
        assert!((weights[0] - 0.5).abs() < 1e-9);
        assert!((weights[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn portfolio_value_sums_market_value() {
        let s = scenario();
        assert!((s.portfolio_value() - 2000.0).abs() < 1e-9);
    }
}
