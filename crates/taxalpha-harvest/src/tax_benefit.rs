//! Estimating the tax benefit of realizing a loss.

use chrono::NaiveDate;

use taxalpha_core::{Account, TaxLot};

/// The estimated dollar tax benefit of selling `lot` at `current_price`,
/// given the owning account's marginal rates. Zero or negative if the lot
/// would realize a gain rather than a loss (harvesting only ever targets
/// losses; a gain "benefit" is not a benefit).
#[must_use]
pub fn estimated_tax_benefit(
    lot: &TaxLot,
    current_price: f64,
    as_of: NaiveDate,
    long_term_holding_days: i64,
    account: &Account,
) -> f64 {
    let unrealized = lot.unrealized_gain_loss(current_price);
    if unrealized >= 0.0 {
        return 0.0;
    }
    let is_long_term = lot.is_long_term(as_of, long_term_holding_days);
    let rate = account.marginal_rate(is_long_term);
    -unrealized * rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxalpha_core::{AccountId, LotId, LotStatus, SecurityId};

    fn account() -> Account {
        Account {
            id: AccountId(1),
            short_term_rate: 0.37,
            long_term_rate: 0.20,
            benchmark_name: None,
            household_id: None,
        }
    }

    fn lot(purchase_price: f64, purchase_date: NaiveDate, qty: f64) -> TaxLot {
        TaxLot {
            id: LotId(1),
            account_id: AccountId(1),
            security_id: SecurityId(1),
            purchase_date,
            purchase_price,
            original_quantity: qty,
            remaining_quantity: qty,
            status: LotStatus::Open,
        }
    }

    #[test]
    fn loss_lot_uses_long_term_rate_when_eligible() {
        let purchase_date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let lot = lot(100.0, purchase_date, 10.0);
        let benefit = estimated_tax_benefit(&lot, 80.0, as_of, 365, &account());
        // Loss of $200 at the 20% long-term rate = $40.
        assert!((benefit - 40.0).abs() < 1e-9);
    }

    #[test]
    fn gain_lot_has_no_benefit() {
        let purchase_date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let lot = lot(50.0, purchase_date, 10.0);
        let benefit = estimated_tax_benefit(&lot, 80.0, as_of, 365, &account());
        assert_eq!(benefit, 0.0);
    }
}
