//! In-process reference implementation of [`AnalyticsStore`] and
//! [`AccountStore`], backed by a single `tokio::sync::RwLock` over plain
//! `HashMap`s. Meant for tests, demos, and the CLI's single-process
//! pipeline runs — not a production persistence layer.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use taxalpha_core::{
    Account, AccountId, Exposure, FactorCovariance, FactorReturn, HouseholdId, Position,
    RebalancingEvent, SecurityId, SpecificVariance, TaxLot, Transaction,
};

use crate::error::{Result, StoreError};
use crate::traits::{AccountStore, AnalyticsStore};

#[derive(Debug, Default)]
struct Inner {
    exposures: HashMap<NaiveDate, Vec<Exposure>>,
    factor_returns: HashMap<NaiveDate, Vec<FactorReturn>>,
    factor_covariance: HashMap<NaiveDate, Vec<FactorCovariance>>,
    specific_variance: HashMap<SecurityId, Vec<SpecificVariance>>,
    accounts: HashMap<AccountId, Account>,
    positions: HashMap<AccountId, Vec<Position>>,
    lots: HashMap<(AccountId, SecurityId), Vec<TaxLot>>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
    rebalancing_events: HashMap<AccountId, Vec<RebalancingEvent>>,
}

/// A shared, in-process store implementing both [`AnalyticsStore`] and
/// [`AccountStore`]. Cloning is cheap (an `Arc` clone); every clone sees
/// the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds (or replaces) one account.
    pub async fn put_account(&self, account: Account) {
        self.inner.write().await.accounts.insert(account.id, account);
    }

    /// Seeds (or replaces) an account's positions.
    pub async fn put_positions(&self, account_id: AccountId, positions: Vec<Position>) {
        self.inner.write().await.positions.insert(account_id, positions);
    }

    /// Seeds (or appends to) the open lots for one security in one account.
    pub async fn put_lots(&self, account_id: AccountId, security_id: SecurityId, lots: Vec<TaxLot>) {
        self.inner
            .write()
            .await
            .lots
            .insert((account_id, security_id), lots);
    }

    /// Appends transactions to an account's transaction history.
    pub async fn put_transactions(&self, account_id: AccountId, transactions: Vec<Transaction>) {
        self.inner
            .write()
            .await
            .transactions
            .entry(account_id)
            .or_default()
            .extend(transactions);
    }
}

impl AnalyticsStore for MemoryStore {
    async fn put_exposures(&self, exposures: Vec<Exposure>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for exposure in exposures {
            inner.exposures.entry(exposure.month_end).or_default().push(exposure);
        }
        Ok(())
    }

    async fn get_exposures(&self, month_end: NaiveDate) -> Result<Vec<Exposure>> {
        Ok(self
            .inner
            .read()
            .await
            .exposures
            .get(&month_end)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_factor_returns(&self, returns: Vec<FactorReturn>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for factor_return in returns {
            inner
                .factor_returns
                .entry(factor_return.month_end)
                .or_default()
                .push(factor_return);
        }
        Ok(())
    }

    async fn get_factor_returns(&self, month_end: NaiveDate) -> Result<Vec<FactorReturn>> {
        Ok(self
            .inner
            .read()
            .await
            .factor_returns
            .get(&month_end)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_factor_covariance(&self, covariance: Vec<FactorCovariance>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for entry in covariance {
            inner
                .factor_covariance
                .entry(entry.month_end)
                .or_default()
                .push(entry);
        }
        Ok(())
    }

    async fn get_factor_covariance(&self, month_end: NaiveDate) -> Result<Vec<FactorCovariance>> {
        Ok(self
            .inner
            .read()
            .await
            .factor_covariance
            .get(&month_end)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_specific_variance(&self, variance: Vec<SpecificVariance>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for row in variance {
            inner.specific_variance.entry(row.security_id).or_default().push(row);
        }
        Ok(())
    }

    async fn latest_specific_variance(
        &self,
        security_id: SecurityId,
        as_of: NaiveDate,
    ) -> Result<Option<SpecificVariance>> {
        Ok(self
            .inner
            .read()
            .await
            .specific_variance
            .get(&security_id)
            .and_then(|rows| rows.iter().filter(|r| r.month_end <= as_of).max_by_key(|r| r.month_end))
            .copied())
    }
}

impl AccountStore for MemoryStore {
    async fn get_account(&self, account_id: AccountId) -> Result<Account> {
        self.inner
            .read()
            .await
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "account",
                key: account_id.to_string(),
            })
    }

    async fn get_positions(&self, account_id: AccountId) -> Result<Vec<Position>> {
        Ok(self
            .inner
            .read()
            .await
            .positions
            .get(&account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_open_lots(&self, account_id: AccountId, security_id: SecurityId) -> Result<Vec<TaxLot>> {
        Ok(self
            .inner
            .read()
            .await
            .lots
            .get(&(account_id, security_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_household_transactions(&self, household_id: HouseholdId) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        let member_accounts: Vec<AccountId> = inner
            .accounts
            .values()
            .filter(|a| a.household_id == Some(household_id))
            .map(|a| a.id)
            .collect();
        Ok(member_accounts
            .into_iter()
            .flat_map(|id| inner.transactions.get(&id).cloned().unwrap_or_default())
            .collect())
    }

    async fn record_rebalancing_event(&self, event: RebalancingEvent) -> Result<()> {
        self.inner
            .write()
            .await
            .rebalancing_events
            .entry(event.account_id)
            .or_default()
            .push(event);
        Ok(())
    }

    async fn get_rebalancing_events(&self, account_id: AccountId) -> Result<Vec<RebalancingEvent>> {
        let mut events = self
            .inner
            .read()
            .await
            .rebalancing_events
            .get(&account_id)
            .cloned()
            .unwrap_or_default();
        events.sort_by(|a, b| b.rebalance_date.cmp(&a.rebalance_date));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxalpha_core::{LotId, LotStatus, RebalancingEventId, RebalancingStatus};

    fn account(id: u64, household: Option<u64>) -> Account {
        Account {
            id: AccountId(id),
            short_term_rate: 0.37,
            long_term_rate: 0.20,
            benchmark_name: None,
            household_id: household.map(taxalpha_core::HouseholdId),
        }
    }

    #[tokio::test]
    async fn round_trips_exposures_by_month_end() {
        let store = MemoryStore::new();
        let month_end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let exposure = Exposure {
            security_id: SecurityId(1),
            factor: taxalpha_core::Factor::Style("Size".into()),
            month_end,
            value: 0.5,
            flags: String::new(),
            computed_at: month_end,
        };
        store.put_exposures(vec![exposure.clone()]).await.unwrap();
        let fetched = store.get_exposures(month_end).await.unwrap();
        assert_eq!(fetched, vec![exposure]);
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let store = MemoryStore::new();
        let result = store.get_account(AccountId(1)).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn household_transactions_span_every_member_account() {
        let store = MemoryStore::new();
        store.put_account(account(1, Some(42))).await;
        store.put_account(account(2, Some(42))).await;
        store.put_account(account(3, Some(7))).await;

        let tx = |account_id: u64| Transaction {
            account_id: AccountId(account_id),
            security_id: SecurityId(1),
            side: taxalpha_core::TransactionSide::Buy,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            quantity: 1.0,
            price: 1.0,
            lot_id: None,
            realized_gain_loss: 0.0,
            wash_sale_flag: false,
        };
        store.put_transactions(AccountId(1), vec![tx(1)]).await;
        store.put_transactions(AccountId(2), vec![tx(2)]).await;
        store.put_transactions(AccountId(3), vec![tx(3)]).await;

        let household_txns = store
            .get_household_transactions(taxalpha_core::HouseholdId(42))
            .await
            .unwrap();
        assert_eq!(household_txns.len(), 2);
    }

    #[tokio::test]
    async fn rebalancing_events_come_back_most_recent_first() {
        let store = MemoryStore::new();
        let event = |date: NaiveDate| RebalancingEvent {
            id: RebalancingEventId(1),
            account_id: AccountId(1),
            rebalance_date: date,
            tracking_error_before: 0.0,
            tracking_error_after: None,
            estimated_tax_benefit: 0.0,
            realized_tax_benefit: None,
            status: RebalancingStatus::Pending,
            trades: Vec::new(),
        };
        store
            .record_rebalancing_event(event(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
            .await
            .unwrap();
        store
            .record_rebalancing_event(event(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
            .await
            .unwrap();

        let events = store.get_rebalancing_events(AccountId(1)).await.unwrap();
        assert_eq!(events[0].rebalance_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[tokio::test]
    async fn round_trips_open_lots_for_an_account_and_security() {
        let store = MemoryStore::new();
        let lot = TaxLot {
            id: LotId(1),
            account_id: AccountId(1),
            security_id: SecurityId(1),
            purchase_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            purchase_price: 90.0,
            original_quantity: 10.0,
            remaining_quantity: 10.0,
            status: LotStatus::Open,
        };
        store.put_lots(AccountId(1), SecurityId(1), vec![lot.clone()]).await;

        let fetched = store.get_open_lots(AccountId(1), SecurityId(1)).await.unwrap();
        assert_eq!(fetched, vec![lot]);

        let other_security = store.get_open_lots(AccountId(1), SecurityId(2)).await.unwrap();
        assert!(other_security.is_empty());
    }
}
