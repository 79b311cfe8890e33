//! Run configuration
//!
//! Defaults: 80/20 split, seed 42, 100 isolation trees, 10% contamination.
//! A JSON file may override any subset of fields.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dataset::Column;
use crate::utils::{validate_contamination, validate_ratio, AnalysisError};

/// Column roles for the feature builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Label column, encoded separately and never a feature
    pub target: Column,
    /// Columns expanded into one indicator per observed value
    pub categorical: Vec<Column>,
    /// Free-text and identifier columns left out of the matrix
    pub excluded: Vec<Column>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            target: Column::AttackType,
            categorical: vec![
                Column::Protocol,
                Column::PacketType,
                Column::TrafficType,
                Column::SeverityLevel,
                Column::NetworkSegment,
                Column::GeoLocation,
                Column::ProxyInformation,
                Column::FirewallLogs,
                Column::IdsIpsAlerts,
                Column::ActionTaken,
                Column::LogSource,
            ],
            excluded: vec![
                Column::Timestamp,
                Column::SourceIp,
                Column::DestinationIp,
                Column::PayloadData,
                Column::MalwareIndicators,
                Column::AlertsWarnings,
                Column::AttackSignature,
                Column::UserInformation,
                Column::DeviceInformation,
            ],
        }
    }
}

/// Train/test partitioning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

/// Decision tree hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_weight_split: f32,
    pub min_weight_leaf: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_weight_split: 2.0,
            min_weight_leaf: 1.0,
        }
    }
}

/// Isolation forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// Rows drawn (without replacement) per tree, capped at the row count
    pub max_samples: usize,
    /// Expected share of outliers, sets the score offset
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub split: SplitConfig,
    pub tree: TreeConfig,
    pub forest: ForestConfig,
    /// How many feature importances to keep in the report
    pub top_features: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            tree: TreeConfig::default(),
            forest: ForestConfig::default(),
            top_features: 10,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document, missing fields fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::ValidationError(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::InputError(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Seed both the split and the forest
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = seed;
        self.forest.seed = seed;
        self
    }

    pub fn with_test_ratio(mut self, ratio: f64) -> Self {
        self.split.test_ratio = ratio;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.forest.contamination = contamination;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.tree.max_depth = Some(depth);
        self
    }

    pub fn with_n_trees(mut self, n: usize) -> Self {
        self.forest.n_trees = n;
        self
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        validate_ratio("test_ratio", self.split.test_ratio)?;
        validate_contamination(self.forest.contamination)?;

        if self.forest.n_trees == 0 {
            return Err(AnalysisError::ValidationError(
                "n_trees must be > 0".to_string(),
            ));
        }
        if self.forest.max_samples < 2 {
            return Err(AnalysisError::ValidationError(format!(
                "max_samples must be >= 2, got {}",
                self.forest.max_samples
            )));
        }
        if self.tree.max_depth == Some(0) {
            return Err(AnalysisError::ValidationError(
                "max_depth must be > 0".to_string(),
            ));
        }

        let features = &self.features;
        for (role, columns) in [
            ("categorical", &features.categorical),
            ("excluded", &features.excluded),
        ] {
            if let Some((i, col)) = columns
                .iter()
                .enumerate()
                .find(|(i, c)| columns[..*i].contains(*c))
            {
                return Err(AnalysisError::ValidationError(format!(
                    "column '{}' listed twice as {} (position {})",
                    col, role, i
                )));
            }
        }
        if let Some(col) = features
            .categorical
            .iter()
            .find(|c| features.excluded.contains(c))
        {
            return Err(AnalysisError::ValidationError(format!(
                "column '{}' is both categorical and excluded",
                col
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new();
        assert_eq!(config.split.test_ratio, 0.2);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.features.target, Column::AttackType);
        assert_eq!(config.top_features, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "split": { "seed": 7 },
            "forest": { "contamination": 0.05 },
            "features": { "excluded": ["Timestamp", "Payload Data"] }
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();

        assert_eq!(config.split.seed, 7);
        assert_eq!(config.split.test_ratio, 0.2);
        assert_eq!(config.forest.contamination, 0.05);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(
            config.features.excluded,
            vec![Column::Timestamp, Column::PayloadData]
        );
        assert_eq!(config.features.categorical.len(), 11);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let json = r#"{ "features": { "categorical": ["Colour"] } }"#;
        assert!(PipelineConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::new()
            .with_seed(9)
            .with_test_ratio(0.3)
            .with_contamination(0.2)
            .with_max_depth(4)
            .with_n_trees(10);

        assert_eq!(config.split.seed, 9);
        assert_eq!(config.forest.seed, 9);
        assert_eq!(config.split.test_ratio, 0.3);
        assert_eq!(config.forest.contamination, 0.2);
        assert_eq!(config.tree.max_depth, Some(4));
        assert_eq!(config.forest.n_trees, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PipelineConfig::new().with_test_ratio(1.0).validate().is_err());
        assert!(PipelineConfig::new().with_contamination(0.0).validate().is_err());
        assert!(PipelineConfig::new().with_n_trees(0).validate().is_err());
        assert!(PipelineConfig::new().with_max_depth(0).validate().is_err());

        let mut config = PipelineConfig::new();
        config.features.excluded.push(Column::Protocol);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let mut config = PipelineConfig::new();
        let first = config.features.categorical[0];
        config.features.categorical.push(first);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::ValidationError(_))
        ));

        let mut config = PipelineConfig::new();
        let first = config.features.excluded[0];
        config.features.excluded.push(first);
        assert!(config.validate().is_err());
    }
}
