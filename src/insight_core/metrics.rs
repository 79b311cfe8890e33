use ndarray::Array1;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::insight_core::label::LabelEncoder;
use crate::utils::type_convert::ratio_or_zero;
use crate::utils::AnalysisError;

/// Counts of (true class, predicted class) pairs
///
/// Rows are true classes, columns predicted classes, both in the order of
/// `classes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<usize>,
    pub labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Build over the sorted union of classes seen in truth and predictions
    pub fn compute(
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
        encoder: &LabelEncoder,
    ) -> Result<Self, AnalysisError> {
        if y_true.len() != y_pred.len() {
            return Err(AnalysisError::ValidationError(format!(
                "y_true length ({}) must match y_pred length ({})",
                y_true.len(),
                y_pred.len()
            )));
        }

        let classes: Vec<usize> = y_true
            .iter()
            .chain(y_pred.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let labels = classes
            .iter()
            .map(|&c| {
                encoder
                    .decode(c)
                    .map(str::to_string)
                    .unwrap_or_else(|| c.to_string())
            })
            .collect();

        let mut counts = vec![vec![0usize; classes.len()]; classes.len()];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            // Both are in `classes` by construction.
            let row = classes.binary_search(&t).unwrap_or_default();
            let col = classes.binary_search(&p).unwrap_or_default();
            counts[row][col] += 1;
        }

        Ok(Self {
            classes,
            labels,
            counts,
        })
    }

    pub fn size(&self) -> usize {
        self.classes.len()
    }

    /// True-class count per row
    pub fn support(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Predicted-class count per column
    pub fn predicted(&self) -> Vec<usize> {
        (0..self.size())
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }

    pub fn diagonal(&self) -> Vec<usize> {
        (0..self.size()).map(|i| self.counts[i][i]).collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.labels.iter().map(String::len).max().unwrap_or(0).max(4);
        let cell_width = self
            .labels
            .iter()
            .map(String::len)
            .chain(self.counts.iter().flatten().map(|n| n.to_string().len()))
            .max()
            .unwrap_or(1);

        write!(f, "{:>w$}", "", w = label_width)?;
        for label in &self.labels {
            write!(f, "  {:>w$}", label, w = cell_width)?;
        }
        writeln!(f)?;

        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "{:>w$}", label, w = label_width)?;
            for count in row {
                write!(f, "  {:>w$}", count, w = cell_width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Precision, recall and F1 for one class or one average
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class and aggregate evaluation of a classifier on the test partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Score predictions against the true test labels
    ///
    /// Zero denominators give 0.0 rather than an error.
    pub fn compute(
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
        encoder: &LabelEncoder,
    ) -> Result<Self, AnalysisError> {
        if y_true.is_empty() {
            return Err(AnalysisError::EmptyInputError(
                "cannot evaluate an empty test partition".to_string(),
            ));
        }

        let confusion = ConfusionMatrix::compute(y_true, y_pred, encoder)?;
        let support = confusion.support();
        let predicted = confusion.predicted();
        let diagonal = confusion.diagonal();

        let per_class: Vec<ClassMetrics> = confusion
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let tp = diagonal[i] as f64;
                let precision = ratio_or_zero(tp, predicted[i] as f64);
                let recall = ratio_or_zero(tp, support[i] as f64);
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1: ratio_or_zero(2.0 * precision * recall, precision + recall),
                    support: support[i],
                }
            })
            .collect();

        let total = confusion.total();
        let accuracy = ratio_or_zero(diagonal.iter().sum::<usize>() as f64, total as f64);

        let n = per_class.len() as f64;
        let macro_avg = ClassMetrics {
            label: "macro avg".to_string(),
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / n,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            ratio_or_zero(
                per_class
                    .iter()
                    .map(|m| metric(m) * m.support as f64)
                    .sum::<f64>(),
                total as f64,
            )
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".to_string(),
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Ok(Self {
            per_class,
            accuracy,
            macro_avg,
            weighted_avg,
            confusion,
        })
    }

    /// Metrics for one class label
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|m| m.label == label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .per_class
            .iter()
            .map(|m| m.label.len())
            .max()
            .unwrap_or(0)
            .max(self.weighted_avg.label.len());

        writeln!(
            f,
            "{:>w$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support",
            w = width
        )?;
        writeln!(f)?;

        for m in &self.per_class {
            write_metrics_row(f, m, width)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support,
            w = width
        )?;
        write_metrics_row(f, &self.macro_avg, width)?;
        write_metrics_row(f, &self.weighted_avg, width)
    }
}

fn write_metrics_row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics, width: usize) -> fmt::Result {
    writeln!(
        f,
        "{:>w$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.label,
        m.precision,
        m.recall,
        m.f1,
        m.support,
        w = width
    )
}
