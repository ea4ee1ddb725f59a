//! Accounts, tax lots, positions, and transactions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{AccountId, HouseholdId, LotId, SecurityId};

/// Open/closed status of a tax lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotStatus {
    /// `remaining_quantity > 0`.
    Open,
    /// `remaining_quantity == 0`; retained for audit.
    Closed,
}

/// An immutable purchase record: (account, security, purchase_date,
/// purchase_price, original_quantity), plus a mutable `remaining_quantity`
/// that tracks partial sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLot {
    /// Stable identifier.
    pub id: LotId,
    /// Owning account.
    pub account_id: AccountId,
    /// Security held.
    pub security_id: SecurityId,
    /// Date the lot was purchased.
    pub purchase_date: NaiveDate,
    /// Price per share at purchase.
    pub purchase_price: f64,
    /// Quantity originally purchased. Immutable.
    pub original_quantity: f64,
    /// Quantity still held; decremented by sells, never negative.
    pub remaining_quantity: f64,
    /// Open or closed.
    pub status: LotStatus,
}

impl TaxLot {
    /// Cost basis of the original purchase: `purchase_price * original_quantity`.
    pub fn cost_basis(&self) -> f64 {
        self.purchase_price * self.original_quantity
    }

    /// Cost basis still attributable to the remaining quantity.
    pub fn remaining_cost_basis(&self) -> f64 {
        self.purchase_price * self.remaining_quantity
    }

    /// Unrealized gain or loss at a given current price, for the
    /// remaining quantity.
    pub fn unrealized_gain_loss(&self, current_price: f64) -> f64 {
        (current_price - self.purchase_price) * self.remaining_quantity
    }

    /// Holding period in days as of a proposed sale date.
    pub fn holding_period_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.purchase_date).num_days()
    }

    /// Whether a sale as of `as_of` would be long-term (>= `long_term_holding_days`).
    pub fn is_long_term(&self, as_of: NaiveDate, long_term_holding_days: i64) -> bool {
        self.holding_period_days(as_of) >= long_term_holding_days
    }

    /// Reduce `remaining_quantity` by `quantity`, closing the lot if it
    /// reaches zero. Returns the realized gain/loss at `sale_price`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientLotQuantity`] if `quantity` exceeds
    /// what remains on the lot.
    pub fn sell(&mut self, quantity: f64, sale_price: f64) -> Result<f64> {
        if quantity > self.remaining_quantity + 1e-9 {
            return Err(CoreError::InsufficientLotQuantity {
                lot_id: self.id.to_string(),
                available: self.remaining_quantity,
                requested: quantity,
            });
        }
        let realized = (sale_price - self.purchase_price) * quantity;
        self.remaining_quantity = (self.remaining_quantity - quantity).max(0.0);
        if self.remaining_quantity <= 1e-9 {
            self.remaining_quantity = 0.0;
            self.status = LotStatus::Closed;
        }
        Ok(realized)
    }
}

/// A buy or sell record tied to an account and security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionSide {
    /// A purchase that opens or adds to a lot.
    Buy,
    /// A sale against one or more existing lots.
    Sell,
}

/// A buy or sell record. Sells are optionally tied to a specific tax lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Owning account.
    pub account_id: AccountId,
    /// Security traded.
    pub security_id: SecurityId,
    /// Buy or sell.
    pub side: TransactionSide,
    /// Transaction date.
    pub date: NaiveDate,
    /// Quantity traded.
    pub quantity: f64,
    /// Price per share.
    pub price: f64,
    /// Tax lot this transaction is tied to (sells only).
    pub lot_id: Option<LotId>,
    /// Realized gain or loss (sells only; zero for a wash sale).
    pub realized_gain_loss: f64,
    /// Whether this sell was disallowed as a wash sale.
    pub wash_sale_flag: bool,
}

/// Derived cache: `(account, security) -> aggregate quantity`. Reconciled
/// against the sum of open-lot remaining quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Owning account.
    pub account_id: AccountId,
    /// Security held.
    pub security_id: SecurityId,
    /// Aggregate quantity held across all open lots.
    pub quantity: f64,
}

/// Reconciles a position against its open lots, per the core invariant
/// `position.quantity == Σ open_lots.remaining_quantity`.
///
/// # Errors
///
/// Returns [`CoreError::InvariantViolation`] if the two disagree by more
/// than a small floating tolerance.
pub fn reconcile_position(position: &Position, lots: &[TaxLot]) -> Result<()> {
    let lot_total: f64 = lots
        .iter()
        .filter(|l| {
            l.account_id == position.account_id
                && l.security_id == position.security_id
                && l.status == LotStatus::Open
        })
        .map(|l| l.remaining_quantity)
        .sum();
    if (lot_total - position.quantity).abs() > 1e-6 {
        return Err(CoreError::InvariantViolation(format!(
            "position {:?}/{:?} quantity {} != sum of open lot remaining quantities {}",
            position.account_id, position.security_id, position.quantity, lot_total
        )));
    }
    Ok(())
}

/// An account: owns positions, tax lots, and transactions; carries the
/// marginal tax rates the harvesting engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier.
    pub id: AccountId,
    /// Short-term marginal tax rate (holding period < `long_term_holding_days`).
    pub short_term_rate: f64,
    /// Long-term marginal tax rate.
    pub long_term_rate: f64,
    /// Benchmark this account is rebalanced against, if any.
    pub benchmark_name: Option<String>,
    /// Household this account belongs to, for joint wash-sale checks.
    pub household_id: Option<HouseholdId>,
}

impl Account {
    /// The marginal rate applicable to a sale with the given holding period.
    pub fn marginal_rate(&self, is_long_term: bool) -> f64 {
        if is_long_term {
            self.long_term_rate
        } else {
            self.short_term_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(remaining: f64) -> TaxLot {
        TaxLot {
            id: LotId(1),
            account_id: AccountId(1),
            security_id: SecurityId(1),
            purchase_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            purchase_price: 110.0,
            original_quantity: 100.0,
            remaining_quantity: remaining,
            status: LotStatus::Open,
        }
    }

    #[test]
    fn sell_closes_lot_when_fully_drained() {
        let mut l = lot(100.0);
        let realized = l.sell(100.0, 90.0).unwrap();
        assert_eq!(realized, -2_000.0);
        assert_eq!(l.remaining_quantity, 0.0);
        assert_eq!(l.status, LotStatus::Closed);
    }

    #[test]
    fn sell_more_than_remaining_is_an_error() {
        let mut l = lot(50.0);
        assert!(l.sell(51.0, 90.0).is_err());
    }

    #[test]
    fn holding_period_and_long_term_threshold() {
        let l = lot(100.0);
        let as_of = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        assert!(l.holding_period_days(as_of) >= 365);
        assert!(l.is_long_term(as_of, 365));
    }

    #[test]
    fn reconcile_position_detects_drift() {
        let lots = vec![lot(40.0)];
        let ok_position = Position {
            account_id: AccountId(1),
            security_id: SecurityId(1),
            quantity: 40.0,
        };
        assert!(reconcile_position(&ok_position, &lots).is_ok());

        let bad_position = Position {
            quantity: 41.0,
            ..ok_position
        };
        assert!(reconcile_position(&bad_position, &lots).is_err());
    }
}
