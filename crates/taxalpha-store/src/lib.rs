#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/taxalpha/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod export;
pub mod memory;
pub mod traits;

pub use context::StoreContext;
pub use error::{Result, StoreError};
pub use export::{export_rebalancing_event, ExportFormat, ExportManifest};
pub use memory::MemoryStore;
pub use traits::{AccountStore, AnalyticsStore};
