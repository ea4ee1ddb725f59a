//! `risk-build` command implementation.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use taxalpha::core::Config;
use taxalpha::risk::RiskPanel;

use crate::pipeline::build_risk_history;
use crate::scenario::Scenario;

/// Builds the risk model for every month-end up to `month_end` and prints
/// a summary of the final cross-section and factor covariance.
pub(crate) async fn run(scenario_path: &Path, month_end: NaiveDate, config_path: Option<&Path>) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let config = Config::load(config_path)?;
    config.validate()?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Risk Model Build                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Scenario:  {}", scenario_path.display());
    println!("Month-end: {month_end}");

    let panel = RiskPanel::new(scenario.panel.clone());
    let history = build_risk_history(&panel, &config, month_end)?;
    let latest = history.latest();

    println!(
        "Months estimated: {} ({} .. {})",
        history.cross_sections.len(),
        history.cross_sections.first().map(|(d, _)| *d).unwrap(),
        month_end,
    );
    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("CROSS-SECTION ({month_end})");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  securities:        {}",
        latest.diagnostics.n_stocks
    );
    println!("  factors:           {}", latest.diagnostics.n_factors);
    println!("  regression method: {:?}", latest.diagnostics.method);
    println!("  condition number:  {:.3e}", latest.diagnostics.condition_number);
    println!("  weighted R^2:      {:.4}", latest.diagnostics.r_squared);
    println!("  exposures rows:    {}", latest.exposures.len());
    println!("  specific variance rows: {}", latest.specific_variances.len());
    println!();
    println!("{:<28} {:>12}", "Factor", "Return");
    println!("{}", "─".repeat(41));
    for fr in &latest.factor_returns {
        println!("{:<28} {:>12.6}", fr.factor.key(), fr.factor_return);
    }
    println!();
    println!("Factor covariance entries: {}", history.factor_covariance.len());
    println!();

    Ok(())
}
