//! `harvest` command implementation.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use taxalpha::core::Config;
use taxalpha::harvest::OpportunityFinder;

use crate::scenario::Scenario;

/// Scores every open lot in the scenario's account for a tax-loss harvest
/// as of `as_of`, printing the ranked opportunities.
pub(crate) async fn run(scenario_path: &Path, as_of: NaiveDate, config_path: Option<&Path>) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let config = Config::load(config_path)?;
    config.validate()?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Tax-Loss Harvest Opportunities                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Scenario: {}", scenario_path.display());
    println!("As of:    {as_of}");
    println!("Account:  {}", scenario.account.id);
    println!();

    let finder = OpportunityFinder::new(
        config.min_tax_loss_threshold,
        config.wash_sale_window_days,
        config.long_term_holding_days,
    );

    let securities = scenario.securities_by_id();
    let candidates = scenario.candidate_securities();

    let opportunities = finder.find_opportunities(
        &scenario.lots,
        &scenario.prices,
        as_of,
        &scenario.account,
        &scenario.transactions,
        &securities,
        &candidates,
        &scenario.returns_by_security,
    );

    if opportunities.is_empty() {
        println!("No harvestable lots found (threshold: ${:.2}).", config.min_tax_loss_threshold);
        return Ok(());
    }

    println!(
        "{:<8} {:<10} {:>14} {:>10} {:<12} {}",
        "Lot", "Security", "Tax benefit", "Score", "Wash sale", "Best replacement"
    );
    println!("{}", "─".repeat(78));
    for opp in &opportunities {
        let best_replacement = opp
            .replacements
            .first()
            .map(|r| format!("{} ({:.2})", r.security_id, r.similarity))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<10} {:>14.2} {:>10.3} {:<12} {}",
            opp.lot_id,
            opp.security_id,
            opp.base_tax_benefit,
            opp.score,
            if opp.is_wash_sale { "yes" } else { "no" },
            best_replacement,
        );
    }
    println!();
    println!("{} opportunit{} found.", opportunities.len(), if opportunities.len() == 1 { "y" } else { "ies" });

    Ok(())
}
