//! Benchmarks and their constituent weights.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::SecurityId;

/// One `(security, effective_date) -> weight` row of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConstituent {
    /// Security in the benchmark.
    pub security_id: SecurityId,
    /// Date this weight became effective.
    pub effective_date: NaiveDate,
    /// Non-negative weight.
    pub weight: f64,
}

/// A named set of constituent weights. Weights at a given `effective_date`
/// must be non-negative and sum to 1 within floating tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    /// Benchmark name, e.g. `"SP500"`.
    pub name: String,
    /// Constituent rows across all effective dates.
    pub constituents: Vec<BenchmarkConstituent>,
}

impl Benchmark {
    /// Constituent weights as of the latest `effective_date <= as_of`.
    pub fn weights_as_of(&self, as_of: NaiveDate) -> Vec<BenchmarkConstituent> {
        let latest = self
            .constituents
            .iter()
            .filter(|c| c.effective_date <= as_of)
            .map(|c| c.effective_date)
            .max();
        match latest {
            Some(date) => self
                .constituents
                .iter()
                .filter(|c| c.effective_date == date)
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Validates that weights at `effective_date` sum to 1 within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BenchmarkWeightsUnbalanced`] otherwise.
    pub fn validate_weights_sum(&self, effective_date: NaiveDate, tolerance: f64) -> Result<()> {
        let sum: f64 = self
            .constituents
            .iter()
            .filter(|c| c.effective_date == effective_date)
            .map(|c| c.weight)
            .sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(CoreError::BenchmarkWeightsUnbalanced {
                benchmark: self.name.clone(),
                date: effective_date,
                sum,
                tolerance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Benchmark {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        Benchmark {
            name: "TEST5".into(),
            constituents: vec![
                BenchmarkConstituent {
                    security_id: SecurityId(1),
                    effective_date: date,
                    weight: 0.2,
                },
                BenchmarkConstituent {
                    security_id: SecurityId(2),
                    effective_date: date,
                    weight: 0.2,
                },
                BenchmarkConstituent {
                    security_id: SecurityId(3),
                    effective_date: date,
                    weight: 0.2,
                },
                BenchmarkConstituent {
                    security_id: SecurityId(4),
                    effective_date: date,
                    weight: 0.2,
                },
                BenchmarkConstituent {
                    security_id: SecurityId(5),
                    effective_date: date,
                    weight: 0.2,
                },
            ],
        }
    }

    #[test]
    fn weights_sum_to_one_validates() {
        let b = sample();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(b.validate_weights_sum(date, 1e-6).is_ok());
    }

    #[test]
    fn unbalanced_weights_are_rejected() {
        let mut b = sample();
        b.constituents[0].weight = 0.5;
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(b.validate_weights_sum(date, 1e-6).is_err());
    }

    #[test]
    fn weights_as_of_picks_latest_prior_date() {
        let b = sample();
        let later = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let weights = b.weights_as_of(later);
        assert_eq!(weights.len(), 5);
    }
}
