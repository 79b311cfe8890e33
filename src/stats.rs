use serde::Serialize;
use std::collections::HashMap;

use crate::dataset::{Column, Dataset};

/// Statistics computed from a numeric column
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub column: Column,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl Statistics {
    /// Compute statistics for a numeric column, skipping missing cells
    pub fn compute(dataset: &Dataset, column: Column) -> Option<Self> {
        let values: Vec<f64> = dataset
            .data
            .iter()
            .filter_map(|record| record.get_numeric(column))
            .collect();

        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Statistics {
            column,
            count,
            mean,
            min,
            max,
            sum,
        })
    }
}

/// Per-value counts of a text column, in first-seen order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDistribution {
    pub column: Column,
    pub counts: Vec<(String, usize)>,
    /// Records where the column is missing
    pub missing: usize,
}

impl ClassDistribution {
    pub fn from_dataset(dataset: &Dataset, column: Column) -> Self {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut missing = 0;

        for record in &dataset.data {
            match record.get_text(column) {
                Some(value) => match positions.get(value) {
                    Some(&pos) => counts[pos].1 += 1,
                    None => {
                        positions.insert(value, counts.len());
                        counts.push((value.to_string(), 1));
                    }
                },
                None => missing += 1,
            }
        }

        Self {
            column,
            counts,
            missing,
        }
    }

    /// Count for one value, 0 when never seen
    pub fn count(&self, value: &str) -> usize {
        self.counts
            .iter()
            .find(|(v, _)| v == value)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}
