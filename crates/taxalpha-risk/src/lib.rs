#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/taxalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Multi-factor equity risk model estimation.
//!
//! The pipeline, in order, for one month-end: compute raw style factor
//! signals ([`style`]) → impute missing values ([`imputation`]) →
//! winsorize and cross-sectionally standardize ([`style::winsorize_and_standardize`])
//! → orthogonalize against Size if configured ([`orthogonalize`]) → build
//! industry/country one-hot exposures ([`classification`]) → run the
//! cross-sectional regression ([`regression`]) → derive specific risk
//! ([`specific_risk`]). [`model::RiskModelBuilder`] orchestrates all of it,
//! plus the separate time-series-only factor covariance step
//! ([`covariance`]).

pub mod classification;
pub mod covariance;
pub mod error;
pub mod imputation;
pub mod model;
pub mod orthogonalize;
pub mod panel;
pub mod regression;
pub mod specific_risk;
pub mod style;

pub use error::{Result, RiskModelError};
pub use model::{CrossSectionOutput, RiskModelBuilder};
pub use panel::{MonthlyRecord, RiskPanel};
