//! Application-specific context: [`taxalpha_core::Context`] plus a
//! concrete analytics/account store pair.
//!
//! Kept out of `taxalpha-core` to avoid a dependency cycle (`Context`
//! would otherwise need to know about `AnalyticsStore`/`AccountStore`,
//! which are defined here, one layer up).

use std::sync::Arc;

use taxalpha_core::Context;

use crate::traits::{AccountStore, AnalyticsStore};

/// Everything a pipeline entry point needs: the ambient `Context`
/// (config + clock) plus the two store handles. Generic over the store
/// implementations so tests can substitute `MemoryStore` and production
/// callers can substitute a networked store without this crate changing.
#[derive(Debug, Clone)]
pub struct StoreContext<A, S>
where
    A: AnalyticsStore,
    S: AccountStore,
{
    /// Configuration and clock.
    pub context: Context,
    /// Read side: risk model output.
    pub analytics: Arc<A>,
    /// Read/write side: accounts, lots, transactions, rebalancing events.
    pub accounts: Arc<S>,
}

impl<A, S> StoreContext<A, S>
where
    A: AnalyticsStore,
    S: AccountStore,
{
    /// Bundles a context with its store handles.
    pub fn new(context: Context, analytics: Arc<A>, accounts: Arc<S>) -> Self {
        Self {
            context,
            analytics,
            accounts,
        }
    }

    /// Today, per the underlying context's clock.
    #[must_use]
    pub fn today(&self) -> chrono::NaiveDate {
        self.context.today()
    }
}

/// A `StoreContext` backed by a single in-process [`crate::MemoryStore`]
/// for both the analytics and account sides.
pub type MemoryStoreContext = StoreContext<crate::MemoryStore, crate::MemoryStore>;

impl MemoryStoreContext {
    /// Builds a context over one shared [`crate::MemoryStore`] instance,
    /// using it for both the analytics and account store handles.
    #[must_use]
    pub fn in_memory(context: Context) -> Self {
        let store = Arc::new(crate::MemoryStore::new());
        Self::new(context, store.clone(), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taxalpha_core::{Config, FixedClock};

    #[test]
    fn in_memory_context_shares_one_store() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let context = Context::new(Config::default(), Arc::new(FixedClock(date)));
        let store_context = MemoryStoreContext::in_memory(context);
        assert_eq!(store_context.today(), date);
        assert!(Arc::ptr_eq(&store_context.analytics, &store_context.accounts));
    }
}
