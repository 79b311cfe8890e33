use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ForestConfig, TreeConfig};
use crate::insight_core::feature::validate_features;
use crate::insight_core::isolation::isolation_scores;
use crate::utils::{percentile, validate_contamination, AnalysisError};

/// Fit a Gini decision tree on the training partition
///
/// # Arguments
/// * `x_train` - Training features (rows=samples, cols=features)
/// * `y_train` - Integer class codes aligned with `x_train` rows
/// * `config` - Depth and minimum-weight limits
///
/// # Returns
/// * `Ok(model)` - Fitted tree
/// * `Err(AnalysisError)` - If validation or training fails
pub fn run_decision_tree(
    x_train: &Array2<f64>,
    y_train: &Array1<usize>,
    config: &TreeConfig,
) -> Result<DecisionTree<f64, usize>, AnalysisError> {
    validate_features(x_train)?;

    if x_train.nrows() != y_train.len() {
        return Err(AnalysisError::ValidationError(format!(
            "x rows ({}) must match y length ({})",
            x_train.nrows(),
            y_train.len()
        )));
    }

    let dataset = DatasetBase::new(x_train.clone(), y_train.clone());

    let model = DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(config.max_depth)
        .min_weight_split(config.min_weight_split)
        .min_weight_leaf(config.min_weight_leaf)
        .fit(&dataset)
        .map_err(|e| AnalysisError::ModelError(format!("decision tree training failed: {}", e)))?;

    debug!(rows = x_train.nrows(), "decision tree fitted");
    Ok(model)
}

/// Predict a class code for every row
pub fn predict_classes(model: &DecisionTree<f64, usize>, x: &Array2<f64>) -> Array1<usize> {
    model.predict(x)
}

/// The `n` most important features by impurity decrease, highest first
pub fn top_feature_importances(
    model: &DecisionTree<f64, usize>,
    names: &[String],
    n: usize,
) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = model
        .feature_importance()
        .into_iter()
        .zip(names)
        .filter(|(weight, _)| *weight > 0.0)
        .map(|(weight, name)| (name.clone(), weight))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Per-row anomaly output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyScores {
    /// Higher = more normal; below zero = outlier
    pub scores: Vec<f64>,
    pub outliers: Vec<bool>,
    /// Raw-score percentile subtracted to center scores on the threshold
    pub offset: f64,
}

impl AnomalyScores {
    pub fn outlier_count(&self) -> usize {
        self.outliers.iter().filter(|&&o| o).count()
    }
}

/// Run isolation forest anomaly detection over the full feature matrix
///
/// # Arguments
/// * `features` - Feature matrix (rows=samples, cols=features)
/// * `config` - Forest size, subsample size, contamination and seed
///
/// # Returns
/// * `Ok(AnomalyScores)` - Offset scores and outlier flags, one per row
/// * `Err(AnalysisError)` - If validation or fitting fails
///
/// # Algorithm
/// Raw forest scores (higher = more normal) are shifted by their
/// `contamination` percentile, so roughly that share of rows ends up
/// strictly below zero and is flagged.
pub fn run_isolation_forest(
    features: &Array2<f64>,
    config: &ForestConfig,
) -> Result<AnomalyScores, AnalysisError> {
    validate_contamination(config.contamination)?;
    validate_features(features)?;

    let raw = isolation_scores(features, config)?;
    let raw = raw.as_slice().ok_or_else(|| {
        AnalysisError::ModelError("score vector is not contiguous".to_string())
    })?;

    let offset = percentile(raw, 100.0 * config.contamination).ok_or_else(|| {
        AnalysisError::EmptyInputError("no scores to threshold".to_string())
    })?;

    let scores: Vec<f64> = raw.iter().map(|s| s - offset).collect();
    let outliers: Vec<bool> = scores.iter().map(|&s| s < 0.0).collect();

    let result = AnomalyScores {
        scores,
        outliers,
        offset,
    };

    info!(
        rows = features.nrows(),
        offset = result.offset,
        outliers = result.outlier_count(),
        "isolation forest scored rows"
    );
    Ok(result)
}
