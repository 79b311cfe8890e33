//! Attack Insight Engine - classification and anomaly scoring for network event logs
//!
//! This library loads tabular security events, drops incomplete rows, encodes
//! them into a numeric feature matrix, evaluates a decision-tree attack-type
//! classifier and scores every row with an isolation forest.

pub mod arrow_handler;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod insight_core;
pub mod stats;
pub mod utils;

pub use config::PipelineConfig;
pub use dataset::{Column, Dataset, Record};
pub use engine::{DatasetSummary, Pipeline, PipelineReport};
pub use stats::{ClassDistribution, Statistics};
pub use utils::AnalysisError;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
