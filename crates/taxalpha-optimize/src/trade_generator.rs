//! Turns a QP solve's target weights into concrete buy/sell trades,
//! picking specific tax lots for each sell via a pluggable
//! [`taxalpha_harvest::LotSelector`].

use std::collections::HashMap;

use taxalpha_core::{RebalancingEventId, RebalancingTrade, SecurityId, TaxLot, TradeSide};
use taxalpha_harvest::LotSelector;

use crate::error::{OptimizeError, Result};
use crate::qp::SolveOutput;

/// Trade weights smaller than this (in absolute portfolio-weight terms)
/// are treated as noise and skipped.
pub const MIN_TRADE_WEIGHT: f64 = 1.0e-6;

/// Builds the ordered (sells, then buys) trade list for one rebalancing
/// event.
///
/// # Errors
///
/// Returns [`OptimizeError::MissingPrice`] if a security being traded has
/// no entry in `prices`, or propagates [`taxalpha_harvest::HarvestError`]
/// if a sell's target quantity exceeds what the security's open lots can
/// supply.
pub fn generate_trades(
    event_id: RebalancingEventId,
    securities: &[SecurityId],
    solve: &SolveOutput,
    portfolio_value: f64,
    prices: &HashMap<SecurityId, f64>,
    open_lots: &HashMap<SecurityId, Vec<TaxLot>>,
    sell_selector: &dyn LotSelector,
) -> Result<Vec<RebalancingTrade>> {
    let mut sells = Vec::new();
    let mut buys = Vec::new();

    for (i, &security_id) in securities.iter().enumerate() {
        let trade_weight = solve.trades[i];
        if trade_weight.abs() < MIN_TRADE_WEIGHT {
            continue;
        }

        let price = *prices
            .get(&security_id)
            .ok_or(OptimizeError::MissingPrice { security_id })?;
        let dollar_amount = trade_weight * portfolio_value;

        if trade_weight > 0.0 {
            buys.push(RebalancingTrade {
                event_id,
                security_id,
                side: TradeSide::Buy,
                lot_id: None,
                quantity: dollar_amount / price,
                price,
                executed_at: None,
            });
            continue;
        }

        let target_quantity = -dollar_amount / price;
        let lots = open_lots.get(&security_id).map(Vec::as_slice).unwrap_or(&[]);
        let selections = sell_selector.select(lots, target_quantity)?;
        for (index, quantity) in selections {
            sells.push(RebalancingTrade {
                event_id,
                security_id,
                side: TradeSide::Sell,
                lot_id: Some(lots[index].id),
                quantity,
                price,
                executed_at: None,
            });
        }
    }

    let sell_count = sells.len();
    let buy_count = buys.len();
    sells.extend(buys);

    tracing::info!(
        event_id = event_id.0,
        sell_count,
        buy_count,
        "trade generation complete"
    );
    Ok(sells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nalgebra::DVector;
    use taxalpha_core::{AccountId, LotId, LotStatus};
    use taxalpha_harvest::Hifo;

    fn lot(id: u64, security_id: u64, qty: f64) -> TaxLot {
        TaxLot {
            id: LotId(id),
            account_id: AccountId(1),
            security_id: SecurityId(security_id),
            purchase_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            purchase_price: 90.0,
            original_quantity: qty,
            remaining_quantity: qty,
            status: LotStatus::Open,
        }
    }

    #[test]
    fn sells_come_before_buys_and_use_the_selected_lots() {
        let securities = vec![SecurityId(1), SecurityId(2)];
        let solve = SolveOutput {
            weights: DVector::from_vec(vec![0.3, 0.7]),
            trades: DVector::from_vec(vec![-0.2, 0.2]),
            tracking_error: 0.0,
            tax_benefit: 0.0,
            iterations: 1,
            converged: true,
        };
        let mut prices = HashMap::new();
        prices.insert(SecurityId(1), 100.0);
        prices.insert(SecurityId(2), 50.0);

        let mut open_lots = HashMap::new();
        open_lots.insert(SecurityId(1), vec![lot(1, 1, 10.0)]);

        let trades = generate_trades(
            RebalancingEventId(1),
            &securities,
            &solve,
            1000.0,
            &prices,
            &open_lots,
            &Hifo,
        )
        .unwrap();

        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[0].security_id, SecurityId(1));
        assert_eq!(trades.last().unwrap().side, TradeSide::Buy);
        assert_eq!(trades.last().unwrap().security_id, SecurityId(2));
    }

    #[test]
    fn missing_price_is_an_error() {
        let securities = vec![SecurityId(1)];
        let solve = SolveOutput {
            weights: DVector::from_vec(vec![0.5]),
            trades: DVector::from_vec(vec![0.5]),
            tracking_error: 0.0,
            tax_benefit: 0.0,
            iterations: 1,
            converged: true,
        };
        let result = generate_trades(
            RebalancingEventId(1),
            &securities,
            &solve,
            1000.0,
            &HashMap::new(),
            &HashMap::new(),
            &Hifo,
        );
        assert!(matches!(result, Err(OptimizeError::MissingPrice { .. })));
    }
}
