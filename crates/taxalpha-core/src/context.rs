//! The ambient `Context` threaded into every top-level entry point.
//!
//! The original system relies on a process-wide default session and a
//! handful of process-wide configuration constants. Here that state is
//! bundled into one explicit value and passed in, rather than read from a
//! global — every public pipeline entry point (`build_risk_model`,
//! `find_harvest_opportunities`, `rebalance_account`) takes a `&Context`.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::config::Config;

/// Supplies "today" to the pipeline. The default implementation reads the
/// system clock; tests substitute a fixed date for determinism.
pub trait Clock: Send + Sync {
    /// The current date, from this clock's point of view.
    fn today(&self) -> NaiveDate;
}

/// A [`Clock`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A [`Clock`] that always returns a fixed date, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// The ambient state every pipeline entry point needs: a configuration
/// snapshot and a clock. Store handles are generic over the traits defined
/// in `taxalpha-store` and are added to an application-specific context
/// there (`taxalpha_store::StoreContext`) to avoid a dependency cycle
/// between `taxalpha-core` and `taxalpha-store`.
#[derive(Clone)]
pub struct Context {
    /// Configuration snapshot for this process.
    pub config: Arc<Config>,
    /// Clock used for "today" throughout the pipeline.
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("today", &self.clock.today())
            .finish()
    }
}

impl Context {
    /// Builds a context from a configuration and a clock.
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            clock,
        }
    }

    /// Builds a context with the default configuration and the system clock.
    pub fn with_defaults() -> Self {
        Self::new(Config::default(), Arc::new(SystemClock))
    }

    /// Today, per this context's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
