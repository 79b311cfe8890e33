/// Utility modules for error handling, value checks and scaling
pub mod error;
pub mod scaling;
pub mod type_convert;

// Re-export commonly used types
pub use error::AnalysisError;
pub use scaling::min_max_scale;
pub use type_convert::{percentile, ratio_or_zero, validate_contamination, validate_ratio};
