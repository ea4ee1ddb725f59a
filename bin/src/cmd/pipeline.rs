//! `pipeline` command implementation: risk model, harvesting, and
//! rebalance in one run, against a fresh in-memory store.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use nalgebra::DVector;

use taxalpha::core::{Config, Context, FixedClock, RebalancingEventId, SecurityId};
use taxalpha::harvest::Fifo;
use taxalpha::optimize::rebalancer::{self, RebalanceRequest};
use taxalpha::risk::RiskPanel;
use taxalpha::store::{AccountStore, MemoryStoreContext};

use crate::pipeline::{build_risk_history, event_id_for, tax_inputs};
use crate::scenario::Scenario;

/// Runs the risk model, harvesting, and rebalance stages end to end for
/// one account and date, then records the resulting event in an
/// in-process store and optionally exports it to `out_dir`.
pub(crate) async fn run(
    scenario_path: &Path,
    date: NaiveDate,
    config_path: Option<&Path>,
    out_dir: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let config = Config::load(config_path)?;
    config.validate()?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Full Pipeline Run                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Scenario: {}", scenario_path.display());
    println!("Date:     {date}");
    println!("Account:  {}", scenario.account.id);
    println!();

    let context = Context::new(config.clone(), Arc::new(FixedClock(date)));
    let store = MemoryStoreContext::in_memory(context);
    store.accounts.put_account(scenario.account.clone()).await;
    store.accounts.put_positions(scenario.account.id, scenario.positions.clone()).await;
    store
        .accounts
        .put_transactions(scenario.account.id, scenario.transactions.clone())
        .await;
    for (security_id, lots) in group_lots(&scenario.lots) {
        store.accounts.put_lots(scenario.account.id, security_id, lots).await;
    }

    println!("[1/3] Building risk model...");
    let panel = RiskPanel::new(scenario.panel.clone());
    let history = build_risk_history(&panel, &config, date)?;
    let latest = history.latest();
    println!(
        "      {} securities, {} factors, weighted R^2 {:.4}",
        latest.diagnostics.n_stocks, latest.diagnostics.n_factors, latest.diagnostics.r_squared
    );

    println!("[2/3] Scoring harvest opportunities...");
    let mut universe: BTreeSet<SecurityId> = scenario.positions.iter().map(|p| p.security_id).collect();
    universe.extend(scenario.benchmark_weights.keys().copied());
    let securities: Vec<SecurityId> = universe.into_iter().collect();
    anyhow::ensure!(!securities.is_empty(), "scenario has no positions or benchmark weights");

    let inputs = tax_inputs(&scenario, &securities, date, &config);
    let harvestable = inputs.tax_coefficients.iter().filter(|c| **c > 0.0).count();
    println!("      {harvestable} of {} securities have a harvestable loss", securities.len());

    println!("[3/3] Solving tax-aware rebalance...");
    let w_current = DVector::from_vec(scenario.current_weights(&securities));
    let w_benchmark = DVector::from_vec(scenario.benchmark_weight_vec(&securities));
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
        open_lots: group_lots(&scenario.lots),
        sell_selector: &selector,
    };

    let (event, compliance) = rebalancer::run(request, &config).context("rebalance solve failed")?;
    println!(
        "      {:?}, {} trade(s), compliance passed: {}",
        event.status,
        event.trades.len(),
        compliance.passed
    );

    store
        .accounts
        .record_rebalancing_event(event.clone())
        .await
        .context("recording rebalancing event")?;

    if let Some(out_dir) = out_dir {
        let manifest = taxalpha::store::export_rebalancing_event(&event, out_dir, taxalpha::store::ExportFormat::Csv)
            .context("exporting rebalancing event")?;
        println!();
        println!("Exported {} trade(s) to {}", manifest.trade_count, manifest.trades_file.display());
        println!("Manifest: {}", manifest.manifest_file.display());
    }

    println!();
    Ok(())
}

fn group_lots(lots: &[taxalpha::core::TaxLot]) -> HashMap<SecurityId, Vec<taxalpha::core::TaxLot>> {
    let mut by_security: HashMap<SecurityId, Vec<taxalpha::core::TaxLot>> = HashMap::new();
    for lot in lots {
        by_security.entry(lot.security_id).or_default().push(lot.clone());
    }
    by_security
}
