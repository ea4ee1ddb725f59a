//! Wash-sale rule detection.
//!
//! A sale at a loss is disallowed if the same security was purchased in
//! the 61-day window centered on the sale date — 30 days before through
//! 30 days after, inclusive of the sale date itself. [`violates_wash_sale`]
//! checks this literal-identity case. The rule is checked both directions
//! (a prior buy before a loss sale, or a rebuy after one) and is extended
//! across every account in the security owner's household, since the IRS
//! applies it at the taxpayer level, not the account level.
//!
//! "Substantially identical" securities are also covered, but not here:
//! [`extend_to_substantially_identical`] grows a restricted-buy set built
//! from literal wash-sale hits to also cover securities highly correlated
//! with a restricted one, using the same similarity model
//! [`crate::replacement`] uses to keep replacement candidates from being
//! too close a substitute.

use std::collections::HashMap;
use std::collections::HashSet;

use chrono::NaiveDate;

use taxalpha_core::{SecurityId, Transaction, TransactionSide};

use crate::replacement::{correlation, CORRELATION_THRESHOLD};

/// Returns `true` if selling `security_id` on `sale_date` would trigger
/// the wash-sale rule, given every buy/sell transaction across the
/// household's accounts (or just one account's transactions, for a
/// standalone account with no household).
///
/// `window_days` is the number of days on *each side* of the sale (30 for
/// the standard 61-day window); the sale date itself is always excluded
/// from the "other" transaction set being checked.
#[must_use]
pub fn violates_wash_sale(
    security_id: SecurityId,
    sale_date: NaiveDate,
    household_transactions: &[Transaction],
    window_days: i64,
) -> bool {
    let window_start = sale_date - chrono::Duration::days(window_days);
    let window_end = sale_date + chrono::Duration::days(window_days);

    household_transactions.iter().any(|t| {
        t.security_id == security_id
            && t.side == TransactionSide::Buy
            && t.date >= window_start
            && t.date <= window_end
            && t.date != sale_date
    })
}

/// Finds every transaction that itself triggers the wash-sale rule
/// against `security_id`, for diagnostics/audit purposes.
#[must_use]
pub fn triggering_purchases<'a>(
    security_id: SecurityId,
    sale_date: NaiveDate,
    household_transactions: &'a [Transaction],
    window_days: i64,
) -> Vec<&'a Transaction> {
    let window_start = sale_date - chrono::Duration::days(window_days);
    let window_end = sale_date + chrono::Duration::days(window_days);

    household_transactions
        .iter()
        .filter(|t| {
            t.security_id == security_id
                && t.side == TransactionSide::Buy
                && t.date >= window_start
                && t.date <= window_end
                && t.date != sale_date
        })
        .collect()
}

/// Grows `restricted` to also cover every security in `universe` whose
/// trailing return correlation with an already-restricted security meets
/// or exceeds [`CORRELATION_THRESHOLD`] — the same bar
/// [`crate::replacement::find_replacements`] uses to reject a candidate as
/// too similar to be a safe swap. A security correlated that tightly with
/// one already wash-sale-restricted is economically the same bet, so
/// buying it would defeat the restriction in substance.
#[must_use]
pub fn extend_to_substantially_identical(
    restricted: &HashSet<SecurityId>,
    universe: &[SecurityId],
    returns_by_security: &HashMap<SecurityId, Vec<f64>>,
) -> HashSet<SecurityId> {
    let mut extended = restricted.clone();
    for &candidate in universe {
        if extended.contains(&candidate) {
            continue;
        }
        let Some(candidate_returns) = returns_by_security.get(&candidate) else {
            continue;
        };
        let is_identical = restricted.iter().any(|r| {
            returns_by_security
                .get(r)
                .and_then(|target_returns| correlation(target_returns, candidate_returns))
                .is_some_and(|c| c >= CORRELATION_THRESHOLD)
        });
        if is_identical {
            extended.insert(candidate);
        }
    }
    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxalpha_core::AccountId;

    fn buy(security_id: SecurityId, date: NaiveDate) -> Transaction {
        Transaction {
            account_id: AccountId(1),
            security_id,
            side: TransactionSide::Buy,
            date,
            quantity: 10.0,
            price: 100.0,
            lot_id: None,
            realized_gain_loss: 0.0,
            wash_sale_flag: false,
        }
    }

    #[test]
    fn buy_before_sale_within_window_triggers() {
        let sale_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let purchase_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let transactions = vec![buy(SecurityId(1), purchase_date)];
        assert!(violates_wash_sale(SecurityId(1), sale_date, &transactions, 30));
    }

    #[test]
    fn rebuy_after_sale_within_window_triggers() {
        let sale_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let rebuy_date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let transactions = vec![buy(SecurityId(1), rebuy_date)];
        assert!(violates_wash_sale(SecurityId(1), sale_date, &transactions, 30));
    }

    #[test]
    fn purchase_outside_window_does_not_trigger() {
        let sale_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let purchase_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let transactions = vec![buy(SecurityId(1), purchase_date)];
        assert!(!violates_wash_sale(SecurityId(1), sale_date, &transactions, 30));
    }

    #[test]
    fn different_security_does_not_trigger() {
        let sale_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let purchase_date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let transactions = vec![buy(SecurityId(2), purchase_date)];
        assert!(!violates_wash_sale(SecurityId(1), sale_date, &transactions, 30));
    }

    #[test]
    fn highly_correlated_security_is_also_restricted() {
        let series_a: Vec<f64> = (0..260).map(|i| (i as f64 * 0.01).sin()).collect();
        let series_b = series_a.clone();
        let mut returns = HashMap::new();
        returns.insert(SecurityId(1), series_a);
        returns.insert(SecurityId(2), series_b);

        let mut restricted = HashSet::new();
        restricted.insert(SecurityId(1));
        let universe = vec![SecurityId(1), SecurityId(2), SecurityId(3)];

        let extended = extend_to_substantially_identical(&restricted, &universe, &returns);
        assert!(extended.contains(&SecurityId(2)));
        assert!(!extended.contains(&SecurityId(3)));
    }

    #[test]
    fn uncorrelated_security_is_not_restricted() {
        let series_a: Vec<f64> = (0..260).map(|i| (i as f64 * 0.01).sin()).collect();
        let series_b: Vec<f64> = (0..260).map(|i| i as f64).collect();
        let mut returns = HashMap::new();
        returns.insert(SecurityId(1), series_a);
        returns.insert(SecurityId(2), series_b);

        let mut restricted = HashSet::new();
        restricted.insert(SecurityId(1));
        let universe = vec![SecurityId(1), SecurityId(2)];

        let extended = extend_to_substantially_identical(&restricted, &universe, &returns);
        assert!(!extended.contains(&SecurityId(2)));
    }
}
