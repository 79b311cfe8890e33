use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::config::FeatureConfig;
use crate::dataset::{Column, ColumnKind, Dataset, Value};
use crate::insight_core::label::LabelEncoder;
use crate::utils::AnalysisError;

/// Indicator columns produced from one categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorGroup {
    pub column: Column,
    /// Index of the group's first indicator in the matrix
    pub start: usize,
    /// Category per indicator, in column order
    pub values: Vec<String>,
}

impl IndicatorGroup {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len()
    }
}

/// Numeric feature table with names discovered at encode time
///
/// Built once by [`FeatureBuilder`]; the name-to-index map never changes
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    groups: Vec<IndicatorGroup>,
}

impl FeatureMatrix {
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|i| self.values.column(i))
    }

    pub fn groups(&self) -> &[IndicatorGroup] {
        &self.groups
    }

    /// Indicator group expanded from `column`, if it was categorical
    pub fn group(&self, column: Column) -> Option<&IndicatorGroup> {
        self.groups.iter().find(|g| g.column == column)
    }
}

/// Feature matrix with its aligned label vector
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDataset {
    pub features: FeatureMatrix,
    pub labels: Array1<usize>,
    pub encoder: LabelEncoder,
}

/// Turns cleaned records into a feature matrix and label vector
pub struct FeatureBuilder<'a> {
    config: &'a FeatureConfig,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(config: &'a FeatureConfig) -> Self {
        Self { config }
    }

    /// Columns copied as-is: everything not target, excluded or categorical
    fn numeric_columns(&self) -> Vec<Column> {
        Column::ALL
            .iter()
            .copied()
            .filter(|c| {
                *c != self.config.target
                    && !self.config.excluded.contains(c)
                    && !self.config.categorical.contains(c)
            })
            .collect()
    }

    fn check_roles(&self, numeric: &[Column]) -> Result<(), AnalysisError> {
        let target = self.config.target;
        if target.kind() != ColumnKind::Text {
            return Err(AnalysisError::EncodingError(format!(
                "target column '{}' must hold text labels",
                target
            )));
        }
        if self.config.categorical.contains(&target) || self.config.excluded.contains(&target) {
            return Err(AnalysisError::EncodingError(format!(
                "target column '{}' cannot also be categorical or excluded",
                target
            )));
        }
        if let Some(col) = self
            .config
            .categorical
            .iter()
            .find(|c| c.kind() != ColumnKind::Text)
        {
            return Err(AnalysisError::EncodingError(format!(
                "column '{}' holds numbers and cannot be expanded into indicators",
                col
            )));
        }
        if let Some(col) = numeric.iter().find(|c| c.kind() != ColumnKind::Number) {
            return Err(AnalysisError::EncodingError(format!(
                "column '{}' holds text but is neither categorical nor excluded",
                col
            )));
        }
        Ok(())
    }

    /// Build the feature matrix, label vector and label encoder
    ///
    /// Rows keep the dataset's order. Numeric columns come first in schema
    /// order, then one indicator group per categorical column in configured
    /// order, categories sorted within each group.
    pub fn build(&self, dataset: &Dataset) -> Result<EncodedDataset, AnalysisError> {
        if dataset.is_empty() {
            return Err(AnalysisError::EmptyInputError(format!(
                "dataset '{}' has no rows to encode",
                dataset.name
            )));
        }

        let numeric = self.numeric_columns();
        self.check_roles(&numeric)?;

        let mut categories: Vec<(Column, Vec<String>)> = Vec::new();
        for &column in &self.config.categorical {
            let mut seen = BTreeSet::new();
            for (row, record) in dataset.data.iter().enumerate() {
                seen.insert(text_cell(record.value(column), column, row)?);
            }
            categories.push((column, seen.into_iter().map(str::to_string).collect()));
        }

        let mut names: Vec<String> = numeric.iter().map(|c| c.header().to_string()).collect();
        let mut groups = Vec::with_capacity(categories.len());
        for (column, values) in categories {
            let start = names.len();
            names.extend(values.iter().map(|v| format!("{}_{}", column.header(), v)));
            groups.push(IndicatorGroup {
                column,
                start,
                values,
            });
        }

        let mut values = Array2::<f64>::zeros((dataset.len(), names.len()));
        for (row, record) in dataset.data.iter().enumerate() {
            for (col_idx, &column) in numeric.iter().enumerate() {
                values[[row, col_idx]] = match record.value(column) {
                    Some(Value::Number(n)) => n,
                    _ => {
                        return Err(AnalysisError::EncodingError(format!(
                            "row {} has no numeric value for '{}'",
                            row, column
                        )))
                    }
                };
            }
            for group in &groups {
                let value = text_cell(record.value(group.column), group.column, row)?;
                // Categories were collected from these same rows, so the lookup always hits.
                if let Ok(offset) = group.values.binary_search_by(|v| v.as_str().cmp(value)) {
                    values[[row, group.start + offset]] = 1.0;
                }
            }
        }

        let mut target_values = Vec::with_capacity(dataset.len());
        for (row, record) in dataset.data.iter().enumerate() {
            target_values.push(text_cell(
                record.value(self.config.target),
                self.config.target,
                row,
            )?);
        }
        let (encoder, labels) = LabelEncoder::fit_transform(target_values);

        let index = names
            .iter()
            .enumerate()
            .rev()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        debug!(
            numeric = numeric.len(),
            indicator_groups = groups.len(),
            "feature layout"
        );
        info!(
            rows = values.nrows(),
            features = values.ncols(),
            classes = encoder.n_classes(),
            "built feature matrix"
        );

        Ok(EncodedDataset {
            features: FeatureMatrix {
                values,
                names,
                index,
                groups,
            },
            labels,
            encoder,
        })
    }
}

fn text_cell<'r>(
    value: Option<Value<'r>>,
    column: Column,
    row: usize,
) -> Result<&'r str, AnalysisError> {
    match value {
        Some(Value::Text(s)) => Ok(s),
        Some(Value::Number(_)) => Err(AnalysisError::EncodingError(format!(
            "column '{}' holds numbers where text is required",
            column
        ))),
        None => Err(AnalysisError::EncodingError(format!(
            "row {} is missing '{}'",
            row, column
        ))),
    }
}

/// Feature matrix together with the anomaly outputs for every row
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatrix {
    pub features: FeatureMatrix,
    /// Decoded target label of each row
    pub labels: Vec<String>,
    /// Higher is more normal; negative means outlier
    pub scores: Vec<f64>,
    pub outliers: Vec<bool>,
}

impl ScoredMatrix {
    pub const SCORE_COLUMN: &'static str = "anomaly_score";
    pub const OUTLIER_COLUMN: &'static str = "is_outlier";

    pub fn new(
        features: FeatureMatrix,
        labels: Vec<String>,
        scores: Vec<f64>,
        outliers: Vec<bool>,
    ) -> Result<Self, AnalysisError> {
        let n = features.nrows();
        if labels.len() != n || scores.len() != n || outliers.len() != n {
            return Err(AnalysisError::ValidationError(format!(
                "row count mismatch: features {}, labels {}, scores {}, flags {}",
                n,
                labels.len(),
                scores.len(),
                outliers.len()
            )));
        }
        Ok(Self {
            features,
            labels,
            scores,
            outliers,
        })
    }

    pub fn nrows(&self) -> usize {
        self.features.nrows()
    }

    /// Feature names followed by the two appended anomaly columns
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.features.names().to_vec();
        names.push(Self::SCORE_COLUMN.to_string());
        names.push(Self::OUTLIER_COLUMN.to_string());
        names
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers.iter().filter(|&&o| o).count()
    }
}

/// Validate feature matrix dimensions and values
///
/// # Arguments
/// * `features` - Feature matrix to validate
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(AnalysisError::ValidationError)` if invalid
pub fn validate_features(features: &Array2<f64>) -> Result<(), AnalysisError> {
    if features.nrows() == 0 {
        return Err(AnalysisError::EmptyInputError(
            "feature matrix cannot be empty".to_string(),
        ));
    }

    if features.ncols() == 0 {
        return Err(AnalysisError::ValidationError(
            "feature matrix must have at least one column".to_string(),
        ));
    }

    if features.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::ValidationError(
            "feature matrix contains NaN or Inf values".to_string(),
        ));
    }

    Ok(())
}
