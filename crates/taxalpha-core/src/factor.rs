//! Risk-model factor definitions and the exposure/return/covariance types
//! produced by the risk model builder (`taxalpha-risk`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::SecurityId;

/// A named source of systematic return: a style factor, an industry
/// factor (one per GICS industry), or a country factor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Factor {
    /// A cross-sectionally standardized style factor, e.g. `Size`, `Beta`.
    Style(String),
    /// A one-hot industry indicator at a given GICS level (sector,
    /// industry, or sub-industry).
    Industry {
        /// Classification level, e.g. `"sector"`, `"industry"`, `"sub_industry"`.
        level: String,
        /// The label at that level, e.g. `"Financials"`.
        label: String,
    },
    /// A one-hot country indicator.
    Country(String),
}

impl Factor {
    /// A stable string key suitable for use as a DataFrame column name or
    /// a persistence key; distinct factors never collide.
    pub fn key(&self) -> String {
        match self {
            Self::Style(name) => name.clone(),
            Self::Industry { level, label } => format!("industry::{level}::{label}"),
            Self::Country(label) => format!("country::{label}"),
        }
    }

    /// Whether this factor participates in orthogonalization against Size
    /// (style factors other than Size itself).
    pub fn is_orthogonalizable_style(&self) -> bool {
        matches!(self, Self::Style(name) if name != "Size")
    }
}

/// The canonical names of the ten style factors this engine computes.
/// Multi-horizon variants (`Momentum6`, `Momentum3`, `Growth3Y`) are
/// additional style factors gated by feature flags, not replacements for
/// these.
pub mod style_names {
    /// Log market capitalization.
    pub const SIZE: &str = "Size";
    /// Market beta over a 60-month window.
    pub const BETA: &str = "Beta";
    /// 12-minus-1 month cumulative return.
    pub const MOMENTUM: &str = "Momentum";
    /// TTM income / market cap.
    pub const EARNINGS_YIELD: &str = "EarningsYield";
    /// log(book equity / market cap).
    pub const BOOK_TO_PRICE: &str = "BookToPrice";
    /// YoY sales growth.
    pub const GROWTH: &str = "Growth";
    /// Negative rolling std of quarterly earnings.
    pub const EARNINGS_VARIABILITY: &str = "EarningsVariability";
    /// (short-term debt + long-term debt) / total assets.
    pub const LEVERAGE: &str = "Leverage";
    /// TTM dividends / market cap.
    pub const DIVIDEND_YIELD: &str = "DividendYield";
    /// Sensitivity to a dollar-index ETF's return.
    pub const CURRENCY_SENSITIVITY: &str = "CurrencySensitivity";
    /// 6-minus-1 month cumulative return (multi-horizon momentum flag).
    pub const MOMENTUM_6: &str = "Momentum6";
    /// 3-minus-1 month cumulative return (multi-horizon momentum flag).
    pub const MOMENTUM_3: &str = "Momentum3";
    /// 3-year sales CAGR (multi-horizon growth flag).
    pub const GROWTH_3Y: &str = "Growth3Y";

    /// The ten factors computed unconditionally, in a fixed order so
    /// the exposure matrix's column order is deterministic across runs.
    pub const CANONICAL: [&str; 10] = [
        SIZE,
        BETA,
        MOMENTUM,
        EARNINGS_YIELD,
        BOOK_TO_PRICE,
        GROWTH,
        EARNINGS_VARIABILITY,
        LEVERAGE,
        DIVIDEND_YIELD,
        CURRENCY_SENSITIVITY,
    ];
}

/// A security's exposure to a factor at a given month-end.
///
/// For style factors this is a cross-sectionally standardized,
/// winsorized real number. For industry/country factors it is a `{0,1}`
/// indicator, with row-sums of 1 within a classification level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    /// Security the exposure belongs to.
    pub security_id: SecurityId,
    /// Factor this exposure measures.
    pub factor: Factor,
    /// Month-end the exposure was computed for.
    pub month_end: NaiveDate,
    /// The exposure value.
    pub value: f64,
    /// Free-text flags, e.g. `"imputed:industry_median"`. Empty if the
    /// exposure was observed directly.
    pub flags: String,
    /// When this row was computed, for audit/debugging.
    pub computed_at: NaiveDate,
}

impl Exposure {
    /// Whether this exposure's value was imputed rather than observed.
    pub fn is_imputed(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// The cross-sectional WLS regression coefficient for one factor at one
/// month-end (see the risk model's regression step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorReturn {
    /// The factor this return applies to.
    pub factor: Factor,
    /// Month-end the return was estimated for.
    pub month_end: NaiveDate,
    /// The regression coefficient (the factor's realized monthly return).
    pub factor_return: f64,
}

/// One entry of the symmetric factor covariance matrix for a month-end.
/// Stored densely, one row per ordered pair `(factor_i, factor_j)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCovariance {
    /// Row factor.
    pub factor_i: Factor,
    /// Column factor.
    pub factor_j: Factor,
    /// Month-end this covariance entry applies to.
    pub month_end: NaiveDate,
    /// The covariance value.
    pub covariance: f64,
}

/// A security's specific (idiosyncratic) variance at a month-end: the
/// squared residual of the cross-sectional regression, optionally
/// smoothed via EWMA and industry-median shrinkage.
///
/// All three columns are always populated; which one the optimizer
/// reads is a fixed configuration decision (see `taxalpha-risk`'s
/// `specific_risk` module).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecificVariance {
    /// Security this specific variance applies to.
    pub security_id: SecurityId,
    /// Month-end this estimate applies to.
    pub month_end: NaiveDate,
    /// Raw squared residual from the regression.
    pub raw: f64,
    /// EWMA-smoothed value against the prior month's smoothed value.
    pub ewma: f64,
    /// `ewma` shrunk toward the security's industry median.
    pub shrunk: f64,
}

/// Diagnostics recorded alongside the cross-sectional regression for a
/// month-end: which fallback method ran and how ill-conditioned the
/// normal equations were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionMethod {
    /// Ordinary weighted least squares via the normal equations.
    Wls,
    /// Ridge-regularized WLS, used when the condition number exceeds 1e10.
    Ridge,
    /// Moore-Penrose pseudo-inverse, used when `XᵀWX` is singular.
    PseudoInverse,
}

/// Diagnostics for one month-end's cross-sectional regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionDiagnostics {
    /// Month-end the regression was run for.
    pub month_end: NaiveDate,
    /// Which method was actually used.
    pub method: RegressionMethod,
    /// Condition number of `XᵀWX` (may be `f64::INFINITY` for a singular matrix).
    pub condition_number: f64,
    /// Ridge alpha used, if `method` was [`RegressionMethod::Ridge`].
    pub alpha: Option<f64>,
    /// Weighted R-squared of the fit.
    pub r_squared: f64,
    /// Number of factors (columns of X).
    pub n_factors: usize,
    /// Number of securities (rows of X) included in the regression.
    pub n_stocks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_key_disambiguates_levels() {
        let a = Factor::Industry {
            level: "sector".into(),
            label: "Financials".into(),
        };
        let b = Factor::Industry {
            level: "industry".into(),
            label: "Financials".into(),
        };
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn size_is_not_orthogonalizable() {
        assert!(!Factor::Style("Size".into()).is_orthogonalizable_style());
        assert!(Factor::Style("Beta".into()).is_orthogonalizable_style());
    }
}
