//! Security identity and price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::SecurityId;

/// Coarse security type, used by the harvesting engine's replacement
/// similarity scoring (same security-type is worth a small bonus) and by
/// the optimizer's sector caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    /// A single listed equity.
    Equity,
    /// An exchange-traded fund.
    Etf,
    /// A mutual fund.
    MutualFund,
    /// Anything else tracked by the analytics store.
    Other,
}

/// A tradable security. Immutable once created; every other entity in the
/// domain model references securities by [`SecurityId`] rather than by
/// ticker, since tickers can be reused after a delisting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    /// Stable internal identifier.
    pub id: SecurityId,
    /// Current ticker symbol.
    pub ticker: String,
    /// Optional cross-vendor key (e.g. a CUSIP or vendor-internal id).
    pub vendor_key: Option<String>,
    /// GICS sector label.
    pub sector: String,
    /// GICS industry label.
    pub industry: String,
    /// Listing exchange, used in replacement-security scoring.
    pub exchange: String,
    /// Country of domicile, used for the risk model's country factor.
    pub country: String,
    /// Coarse security type.
    pub security_type: SecurityType,
}

/// A single (security, date) close price observation. Unique by
/// `(security_id, date)`; append-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Security this price belongs to.
    pub security_id: SecurityId,
    /// Trading date.
    pub date: NaiveDate,
    /// Close price.
    pub close: f64,
    /// Adjusted close, when available (splits/dividends applied).
    pub adjusted_close: Option<f64>,
    /// Trading volume, when available.
    pub volume: Option<u64>,
}

impl PricePoint {
    /// The price to use for valuation: adjusted close if present, else close.
    pub fn effective_price(&self) -> f64 {
        self.adjusted_close.unwrap_or(self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_price_prefers_adjusted_close() {
        let p = PricePoint {
            security_id: SecurityId(1),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: 100.0,
            adjusted_close: Some(98.5),
            volume: None,
        };
        assert_eq!(p.effective_price(), 98.5);
    }

    #[test]
    fn effective_price_falls_back_to_close() {
        let p = PricePoint {
            security_id: SecurityId(1),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: 100.0,
            adjusted_close: None,
            volume: None,
        };
        assert_eq!(p.effective_price(), 100.0);
    }
}
