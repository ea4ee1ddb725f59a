//! Pluggable tax-lot selection strategies for sells.
//!
//! A trait with several interchangeable implementations, selected by the
//! caller rather than baked into the sell path.

use taxalpha_core::TaxLot;

use crate::error::{HarvestError, Result};

/// Chooses which open lots to draw `quantity` shares from when selling a
/// security, and how much to take from each.
pub trait LotSelector {
    /// Returns `(lot_index, quantity_from_that_lot)` pairs (indices into
    /// `lots`) summing to `quantity`, in the order sells should be applied.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InsufficientQuantity`] if the open lots
    /// cannot collectively supply `quantity`.
    fn select(&self, lots: &[TaxLot], quantity: f64) -> Result<Vec<(usize, f64)>>;
}

/// Highest-in, first-out: sells the lots with the highest cost basis per
/// share first, maximizing realized losses (or minimizing realized
/// gains) for a given quantity sold. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hifo;

impl LotSelector for Hifo {
    fn select(&self, lots: &[TaxLot], quantity: f64) -> Result<Vec<(usize, f64)>> {
        select_by_order(lots, quantity, |a, b| {
            b.purchase_price.partial_cmp(&a.purchase_price).unwrap()
        })
    }
}

/// First-in, first-out: sells the oldest lots first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

impl LotSelector for Fifo {
    fn select(&self, lots: &[TaxLot], quantity: f64) -> Result<Vec<(usize, f64)>> {
        select_by_order(lots, quantity, |a, b| a.purchase_date.cmp(&b.purchase_date))
    }
}

/// Minimizes tax impact: at a given `current_price`, prefers loss lots
/// (largest loss first) before touching any gain lots (smallest gain
/// first), so a sell never realizes more gain than necessary.
#[derive(Debug, Clone, Copy)]
pub struct MinTax {
    /// Current market price, used to rank lots by unrealized gain/loss.
    pub current_price: f64,
}

impl MinTax {
    /// Builds a `MinTax` selector for the given current price.
    #[must_use]
    pub const fn new(current_price: f64) -> Self {
        Self { current_price }
    }
}

impl LotSelector for MinTax {
    fn select(&self, lots: &[TaxLot], quantity: f64) -> Result<Vec<(usize, f64)>> {
        select_by_order(lots, quantity, |a, b| {
            let gl_a = a.unrealized_gain_loss(self.current_price) / a.remaining_quantity.max(1e-12);
            let gl_b = b.unrealized_gain_loss(self.current_price) / b.remaining_quantity.max(1e-12);
            gl_a.partial_cmp(&gl_b).unwrap()
        })
    }
}

/// Shared draining logic: orders open lots by `cmp`, then takes from each
/// in order until `quantity` is satisfied.
fn select_by_order(
    lots: &[TaxLot],
    quantity: f64,
    cmp: impl Fn(&TaxLot, &TaxLot) -> std::cmp::Ordering,
) -> Result<Vec<(usize, f64)>> {
    let mut order: Vec<usize> = lots
        .iter()
        .enumerate()
        .filter(|(_, l)| l.remaining_quantity > 1e-9)
        .map(|(i, _)| i)
        .collect();
    order.sort_by(|&a, &b| cmp(&lots[a], &lots[b]));

    let mut remaining = quantity;
    let mut selections = Vec::new();
    for index in order {
        if remaining <= 1e-9 {
            break;
        }
        let take = remaining.min(lots[index].remaining_quantity);
        selections.push((index, take));
        remaining -= take;
    }

    if remaining > 1e-9 {
        let available: f64 = lots.iter().map(|l| l.remaining_quantity).sum();
        let security_id = lots.first().map_or(taxalpha_core::SecurityId(0), |l| l.security_id);
        return Err(HarvestError::InsufficientQuantity {
            security_id,
            requested: quantity,
            available,
        });
    }
    Ok(selections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taxalpha_core::{AccountId, LotId, LotStatus, SecurityId};

    fn lot(id: u64, price: f64, date: &str, qty: f64) -> TaxLot {
        TaxLot {
            id: LotId(id),
            account_id: AccountId(1),
            security_id: SecurityId(1),
            purchase_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            purchase_price: price,
            original_quantity: qty,
            remaining_quantity: qty,
            status: LotStatus::Open,
        }
    }

    #[test]
    fn hifo_takes_highest_cost_basis_first() {
        let lots = vec![lot(1, 90.0, "2022-01-01", 10.0), lot(2, 150.0, "2023-01-01", 10.0)];
        let selections = Hifo.select(&lots, 10.0).unwrap();
        assert_eq!(selections, vec![(1, 10.0)]);
    }

    #[test]
    fn fifo_takes_oldest_first() {
        let lots = vec![lot(1, 90.0, "2022-01-01", 10.0), lot(2, 150.0, "2023-01-01", 10.0)];
        let selections = Fifo.select(&lots, 10.0).unwrap();
        assert_eq!(selections, vec![(0, 10.0)]);
    }

    #[test]
    fn insufficient_lots_is_an_error() {
        let lots = vec![lot(1, 90.0, "2022-01-01", 5.0)];
        assert!(Hifo.select(&lots, 10.0).is_err());
    }

    #[test]
    fn mintax_prefers_losses_over_gains() {
        let lots = vec![lot(1, 200.0, "2022-01-01", 10.0), lot(2, 50.0, "2023-01-01", 10.0)];
        let selector = MinTax::new(100.0);
        let selections = selector.select(&lots, 10.0).unwrap();
        // Lot 0 has a loss at price 100 (bought at 200); lot 1 has a gain.
        assert_eq!(selections, vec![(0, 10.0)]);
    }
}
