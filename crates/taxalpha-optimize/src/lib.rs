#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/taxalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Tax-aware portfolio optimization.
//!
//! [`risk_matrix::build`] densifies the risk model's tabular output into
//! the matrices [`qp::solve`] needs; [`rebalancer::decide`] and
//! [`rebalancer::run`] decide whether a rebalance is warranted and, if
//! so, run the solve end to end; [`trade_generator::generate_trades`]
//! turns the solve's target weights into lot-level trades; and
//! [`compliance::check`] independently re-verifies the result against
//! every constraint the solve was supposed to respect.

pub mod compliance;
pub mod error;
pub mod qp;
pub mod rebalancer;
pub mod risk_matrix;
pub mod trade_generator;

pub use compliance::ComplianceReport;
pub use error::{OptimizeError, Result};
pub use qp::{QpInputs, SectorConstraint, SolveOutput};
pub use rebalancer::{RebalanceDecision, RebalanceReason, RebalanceRequest};
pub use risk_matrix::RiskMatrices;
