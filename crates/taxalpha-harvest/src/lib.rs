#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/taxalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Tax-loss harvesting: wash-sale detection ([`wash_sale`]), replacement
//! security search ([`replacement`]), tax benefit estimation
//! ([`tax_benefit`]), pluggable lot selection for sells ([`lot_selection`]),
//! and [`opportunity::OpportunityFinder`], which ties all of the above into
//! one ranked list of candidate sells.

pub mod error;
pub mod lot_selection;
pub mod opportunity;
pub mod replacement;
pub mod tax_benefit;
pub mod wash_sale;

pub use error::{HarvestError, Result};
pub use lot_selection::{Fifo, Hifo, LotSelector, MinTax};
pub use opportunity::{HarvestOpportunity, OpportunityFinder};
pub use replacement::ReplacementCandidate;
