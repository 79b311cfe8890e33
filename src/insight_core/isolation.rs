//! Isolation forest scoring backed by `aprender`
//!
//! Columns are min-max scaled before the f32 hand-off. Isolation splits are
//! drawn uniformly between a column's bounds, so a per-column affine map
//! leaves the forest's behaviour unchanged while keeping every value finite
//! in f32.

use ndarray::{Array1, Array2};
use tracing::debug;

use crate::config::ForestConfig;
use crate::utils::scaling::min_max_scale;
use crate::utils::AnalysisError;

/// Fit an isolation forest on every row of `features` and score those rows
///
/// # Arguments
/// * `features` - Feature matrix (rows=samples, cols=features)
/// * `config` - Tree count, subsample size and seed
///
/// # Returns
/// * `Ok(scores)` - One raw score per row, higher = more normal
/// * `Err(AnalysisError)` - If the input is empty or the forest fails
pub fn isolation_scores(
    features: &Array2<f64>,
    config: &ForestConfig,
) -> Result<Array1<f64>, AnalysisError> {
    let (n_rows, n_cols) = features.dim();
    if n_rows == 0 {
        return Err(AnalysisError::EmptyInputError(
            "cannot fit an isolation forest on zero rows".to_string(),
        ));
    }
    if config.n_trees == 0 {
        return Err(AnalysisError::ValidationError(
            "n_trees must be > 0".to_string(),
        ));
    }

    let scaled = min_max_scale(features)?;
    let data: Vec<f32> = scaled.iter().map(|&v| v as f32).collect();
    let sample_size = config.max_samples.clamp(1, n_rows);

    let scores = forest_scores(data, n_rows, n_cols, sample_size, config)?;
    if scores.len() != n_rows {
        return Err(AnalysisError::ModelError(format!(
            "isolation forest returned {} scores for {} rows",
            scores.len(),
            n_rows
        )));
    }

    debug!(
        rows = n_rows,
        trees = config.n_trees,
        sample_size,
        "isolation forest fitted"
    );
    Ok(scores)
}

fn forest_scores(
    data: Vec<f32>,
    n_rows: usize,
    n_cols: usize,
    sample_size: usize,
    config: &ForestConfig,
) -> Result<Array1<f64>, AnalysisError> {
    use aprender::prelude::*;

    let matrix = Matrix::from_vec(n_rows, n_cols, data).map_err(|e| {
        AnalysisError::ModelError(format!("failed to build forest input: {}", e))
    })?;

    let mut forest = IsolationForest::new()
        .with_n_estimators(config.n_trees)
        .with_max_samples(sample_size)
        .with_random_state(config.seed);
    forest
        .fit(&matrix)
        .map_err(|e| AnalysisError::ModelError(format!("isolation forest fit failed: {}", e)))?;

    Ok(forest
        .score_samples(&matrix)
        .iter()
        .map(|&s| f64::from(s))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outliers() -> Array2<f64> {
        let mut data = Vec::new();
        for i in 0..50 {
            data.push((i % 10) as f64);
            data.push(((i % 10) + 1) as f64);
        }
        data.extend_from_slice(&[100.0, 100.0]);
        data.extend_from_slice(&[-50.0, -50.0]);
        Array2::from_shape_vec((52, 2), data).unwrap()
    }

    fn config(n_trees: usize) -> ForestConfig {
        ForestConfig {
            n_trees,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_outliers_score_lower() {
        let x = cluster_with_outliers();
        let scores = isolation_scores(&x, &config(100)).unwrap();

        assert_eq!(scores.len(), 52);
        assert!(scores[50] < scores[0]);
        assert!(scores[51] < scores[0]);
    }

    #[test]
    fn test_seeded_fit_is_repeatable() {
        let x = cluster_with_outliers();
        let a = isolation_scores(&x, &config(20)).unwrap();
        let b = isolation_scores(&x, &config(20)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extreme_magnitudes_score() {
        let x = Array2::from_shape_fn((20, 1), |(r, _)| if r % 2 == 0 { 1e308 } else { -1e308 });
        let scores = isolation_scores(&x, &config(10)).unwrap();

        assert_eq!(scores.len(), 20);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_empty_and_invalid_input() {
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            isolation_scores(&empty, &config(5)),
            Err(AnalysisError::EmptyInputError(_))
        ));
        assert!(matches!(
            isolation_scores(&cluster_with_outliers(), &config(0)),
            Err(AnalysisError::ValidationError(_))
        ));
    }
}
