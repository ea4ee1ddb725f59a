//! `rebalance` command implementation.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use nalgebra::DVector;

use taxalpha::core::{Config, RebalancingEventId, SecurityId};
use taxalpha::harvest::Fifo;
use taxalpha::optimize::rebalancer::{self, RebalanceRequest};
use taxalpha::risk::RiskPanel;

use crate::pipeline::{build_risk_history, event_id_for, tax_inputs};
use crate::scenario::Scenario;

/// Solves a tax-aware rebalance for the scenario's account as of `date`
/// and prints the resulting trades and compliance report.
pub(crate) async fn run(scenario_path: &Path, date: NaiveDate, config_path: Option<&Path>) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let config = Config::load(config_path)?;
    config.validate()?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Tax-Aware Rebalance                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Scenario: {}", scenario_path.display());
    println!("Date:     {date}");
    println!("Account:  {}", scenario.account.id);

    let panel = RiskPanel::new(scenario.panel.clone());
    let history = build_risk_history(&panel, &config, date)?;
    let latest = history.latest();

    let mut universe: BTreeSet<SecurityId> = scenario.positions.iter().map(|p| p.security_id).collect();
    universe.extend(scenario.benchmark_weights.keys().copied());
    let securities: Vec<SecurityId> = universe.into_iter().collect();
    anyhow::ensure!(!securities.is_empty(), "scenario has no positions or benchmark weights");

    let w_current = DVector::from_vec(scenario.current_weights(&securities));
    let w_benchmark = DVector::from_vec(scenario.benchmark_weight_vec(&securities));

    let inputs = tax_inputs(&scenario, &securities, date, &config);

    let mut open_lots: HashMap<SecurityId, Vec<_>> = HashMap::new();
    for lot in &scenario.lots {
        open_lots.entry(lot.security_id).or_default().push(lot.clone());
    }

    let selector = Fifo;
    let request = RebalanceRequest {
        event_id: RebalancingEventId::from(event_id_for(date)),
        account_id: scenario.account.id,
        rebalance_date: date,
        securities: securities.clone(),
        w_current,
        w_benchmark,
        exposures: &latest.exposures,
        factor_covariance: &history.factor_covariance,
        specific_variance: &latest.specific_variances,
        tax_coefficients: DVector::from_vec(inputs.tax_coefficients),
        gain_penalties: DVector::from_vec(inputs.gain_penalties),
        wash_sale_restricted: inputs.wash_sale_restricted,
        sector_constraints: Vec::new(),
        portfolio_value: scenario.portfolio_value(),
        prices: scenario.prices.clone(),
        open_lots,
        sell_selector: &selector,
    };

    let (event, compliance) = rebalancer::run(request, &config).context("rebalance solve failed")?;

    println!();
    println!("Status: {:?}", event.status);
    println!("Trades: {}", event.trades.len());
    println!();
    println!("{:<10} {:<6} {:>10} {:>12} {:>8}", "Security", "Side", "Quantity", "Price", "Lot");
    println!("{}", "─".repeat(52));
    for trade in &event.trades {
        println!(
            "{:<10} {:<6} {:>10.2} {:>12.2} {:>8}",
            trade.security_id,
            format!("{:?}", trade.side),
            trade.quantity,
            trade.price,
            trade.lot_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("COMPLIANCE");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  fully invested:        {}", compliance.fully_invested);
    println!("  long only:             {}", compliance.long_only);
    println!("  turnover within limit: {}", compliance.turnover_within_limit);
    println!("  wash-sale safe:        {}", compliance.wash_sale_safe);
    println!("  PASSED:                {}", compliance.passed);
    println!();

    Ok(())
}
