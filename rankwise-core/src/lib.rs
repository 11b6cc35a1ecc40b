//! # Rankwise Core
//!
//! Core library for Rankwise comparison sites.
//! Provides the product catalog, the ranking and comparison engines that
//! page builders call, FAQ templating, configuration, and the WebRTC leak
//! probe behind the "is my VPN leaking?" tool.

pub mod catalog;
pub mod comparison;
pub mod config;
pub mod error;
pub mod faq;
pub mod probe;
pub mod ranking;

// Re-export commonly used types at the crate root.
pub use catalog::{Catalog, InMemoryCatalog, Product, ProductId, Vertical};
pub use comparison::{Comparison, ComparisonRoute, TieBreak, generate_comparison};
pub use config::{RankwiseConfig, config_exists, load_config};
pub use error::{CatalogError, ConfigError, ProbeError, RankwiseError, Result};
pub use probe::{LeakProbe, LeakTestResult, OverallStatus, ProbeState};
