//! CSV/Parquet export of rebalancing output, plus a JSON manifest
//! describing what was written. Downstream consumers (reporting,
//! compliance archival) read the manifest to locate the data files
//! without guessing naming conventions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use taxalpha_core::{RebalancingEvent, TradeSide};

use crate::error::Result;

/// Which tabular format [`export_rebalancing_event`] should write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Plain CSV, one file per table.
    Csv,
    /// Columnar Parquet, one file per table.
    Parquet,
}

/// Describes one export run: which files were written and when, so a
/// downstream job can discover them without re-deriving the naming
/// convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Account the exported event belongs to.
    pub account_id: u64,
    /// Rebalance date of the exported event.
    pub rebalance_date: NaiveDate,
    /// Format the trades table was written in.
    pub format: ExportFormat,
    /// Path to the trades table, relative to `output_dir`.
    pub trades_file: PathBuf,
    /// Path to this manifest itself, relative to `output_dir`.
    pub manifest_file: PathBuf,
    /// Number of trades in the exported event.
    pub trade_count: usize,
    /// Total estimated tax benefit of the exported event.
    pub estimated_tax_benefit: f64,
}

/// Writes `event`'s trades as a tabular file plus a JSON manifest under
/// `output_dir`, returning the manifest that was written.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Io`] if `output_dir` cannot be
/// created or a file cannot be written, or
/// [`crate::error::StoreError::DataFrame`] if the trades table cannot be
/// assembled.
pub fn export_rebalancing_event(
    event: &RebalancingEvent,
    output_dir: &Path,
    format: ExportFormat,
) -> Result<ExportManifest> {
    fs::create_dir_all(output_dir)?;

    let base_name = format!("rebalance_{}_{}", event.account_id.0, event.rebalance_date);
    let mut trades_df = trades_data_frame(event)?;

    let trades_file = match format {
        ExportFormat::Csv => {
            let path = PathBuf::from(format!("{base_name}_trades.csv"));
            let mut file = fs::File::create(output_dir.join(&path))?;
            CsvWriter::new(&mut file).include_header(true).finish(&mut trades_df)?;
            path
        }
        ExportFormat::Parquet => {
            let path = PathBuf::from(format!("{base_name}_trades.parquet"));
            let mut file = fs::File::create(output_dir.join(&path))?;
            ParquetWriter::new(&mut file).finish(&mut trades_df)?;
            path
        }
    };

    let manifest_file = PathBuf::from(format!("{base_name}_manifest.json"));
    let manifest = ExportManifest {
        account_id: event.account_id.0,
        rebalance_date: event.rebalance_date,
        format,
        trades_file,
        manifest_file: manifest_file.clone(),
        trade_count: event.trades.len(),
        estimated_tax_benefit: event.estimated_tax_benefit,
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)?;
    fs::write(output_dir.join(&manifest_file), manifest_json)?;

    info!(
        account_id = event.account_id.0,
        rebalance_date = %event.rebalance_date,
        trade_count = event.trades.len(),
        "exported rebalancing event"
    );
    Ok(manifest)
}

fn trades_data_frame(event: &RebalancingEvent) -> Result<DataFrame> {
    let security_id: Vec<u64> = event.trades.iter().map(|t| t.security_id.0).collect();
    let side: Vec<&str> = event
        .trades
        .iter()
        .map(|t| match t.side {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        })
        .collect();
    let lot_id: Vec<Option<u64>> = event.trades.iter().map(|t| t.lot_id.map(|id| id.0)).collect();
    let quantity: Vec<f64> = event.trades.iter().map(|t| t.quantity).collect();
    let price: Vec<f64> = event.trades.iter().map(|t| t.price).collect();
    let notional: Vec<f64> = event.trades.iter().map(|t| t.signed_notional()).collect();

    Ok(df!(
        "security_id" => security_id,
        "side" => side,
        "lot_id" => lot_id,
        "quantity" => quantity,
        "price" => price,
        "signed_notional" => notional,
    )?)
}
