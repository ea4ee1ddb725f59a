//! Momentum: cumulative return over a trailing window, skipping the most
//! recent month to avoid short-term reversal contamination.

use chrono::NaiveDate;

use taxalpha_core::SecurityId;

use crate::panel::RiskPanel;
use crate::style::StyleFactor;

/// Cumulative return from `t - window_months` to `t - 1` (the "12-1"
/// convention when `window_months == 12`). The most recent month is
/// excluded from every horizon, including the multi-horizon variants
/// (`Momentum6`, `Momentum3`).
#[derive(Debug, Clone, Copy)]
pub struct Momentum {
    /// The factor's name (`Momentum`, `Momentum6`, or `Momentum3`).
    pub factor_name: &'static str,
    /// Total window, in months, including the skipped most-recent month.
    pub window_months: usize,
}

impl Momentum {
    /// The canonical 12-1 momentum factor.
    #[must_use]
    pub const fn canonical() -> Self {
        Self {
            factor_name: taxalpha_core::factor::style_names::MOMENTUM,
            window_months: 12,
        }
    }

    /// The 6-1 multi-horizon variant.
    #[must_use]
    pub const fn six_month() -> Self {
        Self {
            factor_name: taxalpha_core::factor::style_names::MOMENTUM_6,
            window_months: 6,
        }
    }

    /// The 3-1 multi-horizon variant.
    #[must_use]
    pub const fn three_month() -> Self {
        Self {
            factor_name: taxalpha_core::factor::style_names::MOMENTUM_3,
            window_months: 3,
        }
    }
}

impl StyleFactor for Momentum {
    fn name(&self) -> &'static str {
        self.factor_name
    }

    fn raw_signal(&self, panel: &RiskPanel, month_end: NaiveDate) -> Vec<(SecurityId, f64)> {
        panel
            .cross_section(month_end)
            .into_iter()
            .map(|r| r.security_id)
            .filter_map(|security_id| {
                let history = panel.history(security_id, month_end, self.window_months);
                if history.len() < self.window_months {
                    return None;
                }
                // Skip the most recent month (last element).
                let usable = &history[..history.len() - 1];
                if usable.is_empty() {
                    return None;
                }
                let cumulative = usable
                    .iter()
                    .map(|r| 1.0 + r.monthly_return)
                    .product::<f64>()
                    - 1.0;
                Some((security_id, cumulative))
            })
            .collect()
    }
}
