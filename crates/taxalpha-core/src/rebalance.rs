//! Rebalancing events and the trades they own.
//!
//! Per the design note on tagged variants over duck typing, every status
//! field here is a closed enum, not a string, so a match on it is
//! exhaustiveness-checked by the compiler.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, LotId, RebalancingEventId, SecurityId};

/// Status of a rebalancing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalancingStatus {
    /// Created but not yet executed.
    Pending,
    /// Trades executed and the account store updated.
    Executed,
    /// Aborted; no trades persisted as executed.
    Failed,
    /// No rebalance was needed; zero trades.
    Skipped,
}

/// Whether a trade is a buy or a sell, and what it is tied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    /// A buy, tied to a security (the lot is created at execution time).
    Buy,
    /// A sell, tied to a specific tax lot.
    Sell,
}

/// One buy or sell within a [`RebalancingEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingTrade {
    /// Owning rebalancing event.
    pub event_id: RebalancingEventId,
    /// Security being traded.
    pub security_id: SecurityId,
    /// Buy or sell.
    pub side: TradeSide,
    /// Tax lot this trade sells from (sells only).
    pub lot_id: Option<LotId>,
    /// Quantity to trade.
    pub quantity: f64,
    /// Price used to size the trade.
    pub price: f64,
    /// Set once the trade has actually been executed.
    pub executed_at: Option<NaiveDateTime>,
}

impl RebalancingTrade {
    /// Signed dollar notional: positive for buys, negative for sells.
    pub fn signed_notional(&self) -> f64 {
        match self.side {
            TradeSide::Buy => self.quantity * self.price,
            TradeSide::Sell => -self.quantity * self.price,
        }
    }
}

/// One rebalancing cycle for an account on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingEvent {
    /// Stable identifier.
    pub id: RebalancingEventId,
    /// Account being rebalanced.
    pub account_id: AccountId,
    /// Date of the rebalance.
    pub rebalance_date: NaiveDate,
    /// Tracking error estimate before the rebalance.
    pub tracking_error_before: f64,
    /// Tracking error estimate after the rebalance (only meaningful once executed).
    pub tracking_error_after: Option<f64>,
    /// Total estimated (pre-execution) tax benefit of the harvested lots.
    pub estimated_tax_benefit: f64,
    /// Total realized tax benefit once trades execute.
    pub realized_tax_benefit: Option<f64>,
    /// Current status.
    pub status: RebalancingStatus,
    /// Trades owned by this event, in emission order (all sells, then all buys).
    pub trades: Vec<RebalancingTrade>,
}

impl RebalancingEvent {
    /// Whether executing this event is expected to reduce tracking error
    /// (Testable Property 8): always true for a `Skipped` or `Failed`
    /// event since no comparison applies.
    pub fn tracking_error_improved(&self) -> bool {
        match (self.status, self.tracking_error_after) {
            (RebalancingStatus::Executed, Some(after)) => after <= self.tracking_error_before + 1e-9,
            _ => true,
        }
    }
}
