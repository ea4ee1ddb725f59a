//! Newtype identifiers used throughout the domain model.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Stable internal identifier for a [`crate::security::Security`].
///
/// Distinct from the ticker, which can be reused across delistings and
/// renames; the id never changes once assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
pub struct SecurityId(pub u64);

/// Stable internal identifier for an [`crate::account::Account`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
pub struct AccountId(pub u64);

/// Stable internal identifier for a household grouping of accounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
pub struct HouseholdId(pub u64);

/// Stable internal identifier for a [`crate::account::TaxLot`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
pub struct LotId(pub u64);

/// Stable internal identifier for a [`crate::rebalance::RebalancingEvent`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
pub struct RebalancingEventId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_their_inner_value() {
        assert_eq!(SecurityId(42).to_string(), "42");
        assert_eq!(AccountId(7).to_string(), "7");
    }

    #[test]
    fn ids_are_ordered_by_inner_value() {
        assert!(LotId(1) < LotId(2));
    }
}
