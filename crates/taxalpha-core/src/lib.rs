#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/taxalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core domain model for the tax-aware portfolio construction engine.
//!
//! This crate has no knowledge of how the risk model is estimated, how
//! harvesting opportunities are scored, or how the optimizer solves its
//! QP — it only defines the shared vocabulary (securities, tax lots,
//! accounts, benchmarks, rebalancing events) and the ambient `Context`
//! those other crates are built against.

/// The version of the taxalpha-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod account;
pub mod benchmark;
pub mod config;
pub mod context;
pub mod error;
pub mod factor;
pub mod ids;
pub mod rebalance;
pub mod security;
pub mod stats;

pub use account::{Account, LotStatus, Position, TaxLot, Transaction, TransactionSide};
pub use benchmark::{Benchmark, BenchmarkConstituent};
pub use config::{Config, FeatureFlags};
pub use context::{Clock, Context, FixedClock, SystemClock};
pub use error::{CoreError, Result};
pub use factor::{
    Exposure, Factor, FactorCovariance, FactorReturn, RegressionDiagnostics, RegressionMethod,
    SpecificVariance,
};
pub use ids::{AccountId, HouseholdId, LotId, RebalancingEventId, SecurityId};
pub use rebalance::{RebalancingEvent, RebalancingStatus, RebalancingTrade, TradeSide};
pub use security::{PricePoint, Security, SecurityType};
