//! Seeded train/test partitioning
//!
//! Plain random permutation, no stratification: on small or imbalanced data a
//! class can vanish from one side, which surfaces as a degenerate split.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::debug;

use crate::utils::{validate_ratio, AnalysisError};

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Row-aligned train/test copies of features and labels
#[derive(Debug, Clone)]
pub struct Partitions {
    pub x_train: Array2<f64>,
    pub y_train: Array1<usize>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<usize>,
}

/// Shuffle row indices with a seeded RNG and cut off the test share
///
/// The test partition holds `ceil(n_rows * test_ratio)` rows, the train
/// partition the rest. Same seed and row count always give the same split.
pub fn train_test_split(
    n_rows: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<SplitIndices, AnalysisError> {
    validate_ratio("test_ratio", test_ratio)?;

    if n_rows == 0 {
        return Err(AnalysisError::EmptyInputError(
            "cannot split zero rows".to_string(),
        ));
    }

    let n_test = (n_rows as f64 * test_ratio).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(AnalysisError::DegenerateSplitError(format!(
            "{} rows at test_ratio {} leave {} train / {} test rows",
            n_rows, test_ratio, n_train, n_test
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    debug!(train = train.len(), test = indices.len(), seed, "split rows");

    Ok(SplitIndices {
        train,
        test: indices,
    })
}

impl SplitIndices {
    /// Copy the selected rows out of `features` and `labels`
    pub fn apply(&self, features: &Array2<f64>, labels: &Array1<usize>) -> Partitions {
        Partitions {
            x_train: features.select(Axis(0), &self.train),
            y_train: labels.select(Axis(0), &self.train),
            x_test: features.select(Axis(0), &self.test),
            y_test: labels.select(Axis(0), &self.test),
        }
    }
}

/// Fail unless a partition holds at least two distinct classes
pub fn ensure_multiclass(partition: &str, labels: &Array1<usize>) -> Result<(), AnalysisError> {
    if labels.is_empty() {
        return Err(AnalysisError::DegenerateSplitError(format!(
            "{} partition is empty",
            partition
        )));
    }

    let distinct: HashSet<usize> = labels.iter().copied().collect();
    if distinct.len() < 2 {
        return Err(AnalysisError::DegenerateSplitError(format!(
            "{} partition holds a single class",
            partition
        )));
    }
    Ok(())
}
