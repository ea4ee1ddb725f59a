#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/taxalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # taxalpha
//!
//! Tax-aware portfolio construction engine.
//!
//! taxalpha re-exports all taxalpha sub-crates for convenience. It
//! provides a unified API for building a risk model, finding tax-loss
//! harvesting opportunities, and solving tax-aware rebalances.
//!
//! ## Quick Start
//!
//! ```ignore
//! use taxalpha::{Config, RiskModelBuilder, OptimizeError};
//! use taxalpha::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let store = MemoryStore::new();
//! // ... build a risk panel, find opportunities, run a rebalance.
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - domain model: securities, accounts, tax lots, rebalancing
//!   events ([`taxalpha_core`])
//! - [`risk`] - multi-factor risk model estimation ([`taxalpha_risk`])
//! - [`harvest`] - tax-loss harvesting opportunity scoring ([`taxalpha_harvest`])
//! - [`optimize`] - the tax-aware rebalancing optimizer ([`taxalpha_optimize`])
//! - [`store`] - persistence traits and an in-process reference store ([`taxalpha_store`])
//!
//! ## Pipeline
//!
//! 1. **Risk model** ([`risk::RiskModelBuilder`]) estimates factor
//!    exposures, factor returns, factor covariance, and specific risk
//!    for one month-end.
//! 2. **Harvesting** ([`harvest::OpportunityFinder`]) scores candidate
//!    tax-loss-harvesting lots against wash-sale rules and replacement
//!    availability.
//! 3. **Optimization** ([`optimize::rebalancer::run`]) assembles the
//!    risk matrices, solves the tax-aware QP, checks compliance, and
//!    generates lot-level trades.
//! 4. **Persistence** ([`store::MemoryStore`] or a custom
//!    [`store::AccountStore`]/[`store::AnalyticsStore`] implementation)
//!    reads and writes every stage's inputs and outputs.

/// Version information for the taxalpha crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The union of every sub-crate's error type, for callers that drive the
/// whole pipeline (risk model through rebalance) from one call site and
/// don't need to distinguish which stage failed.
#[derive(Debug, thiserror::Error)]
pub enum TaxAlphaError {
    /// Domain model / configuration error.
    #[error(transparent)]
    Core(#[from] taxalpha_core::CoreError),
    /// Risk model estimation error.
    #[error(transparent)]
    Risk(#[from] taxalpha_risk::RiskModelError),
    /// Harvesting opportunity scoring error.
    #[error(transparent)]
    Harvest(#[from] taxalpha_harvest::HarvestError),
    /// Rebalance optimization error.
    #[error(transparent)]
    Optimize(#[from] taxalpha_optimize::OptimizeError),
    /// Persistence error.
    #[error(transparent)]
    Store(#[from] taxalpha_store::StoreError),
}

// ============================================================================
// Domain model
// ============================================================================

/// Core domain model: securities, accounts, tax lots, benchmarks,
/// rebalancing events, and the shared `Context`.
///
/// Re-exports [`taxalpha_core`] in full.
pub mod core {
    pub use taxalpha_core::*;
}

// Re-export the most commonly used domain types at the top level.
pub use taxalpha_core::{
    Account, AccountId, Config, Context, CoreError, Exposure, Factor, FactorCovariance,
    FactorReturn, HouseholdId, LotId, RebalancingEvent, RebalancingEventId, RebalancingStatus,
    RebalancingTrade, Result, SecurityId, SpecificVariance, TaxLot, TradeSide, Transaction,
};

// ============================================================================
// Risk model
// ============================================================================

/// Multi-factor equity risk model estimation.
///
/// Re-exports [`taxalpha_risk`] in full. See [`risk::RiskModelBuilder`]
/// for the month-end pipeline entry point.
pub mod risk {
    pub use taxalpha_risk::*;
}

pub use taxalpha_risk::RiskModelBuilder;

// ============================================================================
// Tax-loss harvesting
// ============================================================================

/// Tax-loss harvesting opportunity scoring, wash-sale detection, and
/// replacement-security screening.
///
/// Re-exports [`taxalpha_harvest`] in full. See
/// [`harvest::OpportunityFinder`] for the scoring entry point.
pub mod harvest {
    pub use taxalpha_harvest::*;
}

pub use taxalpha_harvest::{Fifo, Hifo, HarvestOpportunity, MinTax, OpportunityFinder};

// ============================================================================
// Optimization
// ============================================================================

/// The tax-aware rebalancing optimizer: risk matrix assembly, the QP
/// solve, compliance checks, and lot-level trade generation.
///
/// Re-exports [`taxalpha_optimize`] in full. See
/// [`optimize::rebalancer`] for the orchestration entry point.
pub mod optimize {
    pub use taxalpha_optimize::*;
}

pub use taxalpha_optimize::{ComplianceReport, OptimizeError, RebalanceDecision, RebalanceReason};

// ============================================================================
// Persistence
// ============================================================================

/// Persistence traits ([`store::AnalyticsStore`], [`store::AccountStore`])
/// and an in-process reference implementation ([`store::MemoryStore`]).
///
/// Re-exports [`taxalpha_store`] in full.
pub mod store {
    pub use taxalpha_store::*;
}

pub use taxalpha_store::{
    AccountStore, AnalyticsStore, MemoryStore, MemoryStoreContext, StoreContext, StoreError,
};

// ============================================================================
// Prelude
// ============================================================================

/// Convenience re-export of the most commonly used types and traits.
///
/// ```ignore
/// use taxalpha::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        Account, AccountId, Config, Context, RebalancingEvent, SecurityId, TaxLot,
    };
    pub use crate::harvest::{HarvestOpportunity, OpportunityFinder};
    pub use crate::optimize::{ComplianceReport, RebalanceRequest, RiskMatrices, SolveOutput};
    pub use crate::store::{AccountStore, AnalyticsStore, MemoryStore, MemoryStoreContext};
    pub use crate::{CoreError, OptimizeError, Result, TaxAlphaError};
}
