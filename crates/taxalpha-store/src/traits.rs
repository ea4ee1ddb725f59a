//! Persistence traits. Library crates upstream of storage (`taxalpha-risk`,
//! `taxalpha-harvest`, `taxalpha-optimize`) never read or write these
//! directly — only the CLI binary wires a concrete store in.

use std::future::Future;

use chrono::NaiveDate;

use taxalpha_core::{
    Account, AccountId, Exposure, FactorCovariance, FactorReturn, HouseholdId, Position,
    RebalancingEvent, SecurityId, SpecificVariance, TaxLot, Transaction,
};

use crate::error::Result;

/// Persists and retrieves risk model output: exposures, factor returns,
/// factor covariance, and specific variance, each keyed by month-end.
pub trait AnalyticsStore: Send + Sync {
    /// Persists a batch of exposures (any existing rows for the same
    /// `(security_id, factor, month_end)` are overwritten).
    fn put_exposures(
        &self,
        exposures: Vec<Exposure>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns every exposure recorded for `month_end`.
    fn get_exposures(&self, month_end: NaiveDate) -> impl Future<Output = Result<Vec<Exposure>>> + Send;

    /// Persists a batch of factor returns.
    fn put_factor_returns(
        &self,
        returns: Vec<FactorReturn>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns every factor return recorded for `month_end`.
    fn get_factor_returns(
        &self,
        month_end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<FactorReturn>>> + Send;

    /// Persists a batch of factor covariance entries.
    fn put_factor_covariance(
        &self,
        covariance: Vec<FactorCovariance>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns every factor covariance entry recorded for `month_end`.
    fn get_factor_covariance(
        &self,
        month_end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<FactorCovariance>>> + Send;

    /// Persists a batch of specific variance rows.
    fn put_specific_variance(
        &self,
        variance: Vec<SpecificVariance>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns the most recent specific variance row for `security_id` at
    /// or before `as_of`, used to seed the next month's EWMA smoothing.
    fn latest_specific_variance(
        &self,
        security_id: SecurityId,
        as_of: NaiveDate,
    ) -> impl Future<Output = Result<Option<SpecificVariance>>> + Send;
}

/// Persists and retrieves account-level domain state: accounts,
/// positions, tax lots, transactions, and rebalancing events.
pub trait AccountStore: Send + Sync {
    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::NotFound`] if no such account exists.
    fn get_account(&self, account_id: AccountId) -> impl Future<Output = Result<Account>> + Send;

    /// Returns every position held in `account_id`.
    fn get_positions(&self, account_id: AccountId) -> impl Future<Output = Result<Vec<Position>>> + Send;

    /// Returns every open tax lot for `security_id` within `account_id`.
    fn get_open_lots(
        &self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> impl Future<Output = Result<Vec<TaxLot>>> + Send;

    /// Returns every transaction across every account belonging to
    /// `household_id`, used for household-level wash-sale detection.
    fn get_household_transactions(
        &self,
        household_id: HouseholdId,
    ) -> impl Future<Output = Result<Vec<Transaction>>> + Send;

    /// Records a new rebalancing event (and its trades).
    fn record_rebalancing_event(
        &self,
        event: RebalancingEvent,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns every rebalancing event recorded for `account_id`, most
    /// recent first.
    fn get_rebalancing_events(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<Vec<RebalancingEvent>>> + Send;
}
