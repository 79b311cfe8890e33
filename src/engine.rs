use serde::Serialize;
use std::path::Path;
use tracing::{info, info_span, warn};

use crate::config::PipelineConfig;
use crate::dataset::{CleaningSummary, Column, Dataset};
use crate::insight_core::{
    ensure_multiclass, predict_classes, run_decision_tree, run_isolation_forest,
    top_feature_importances, train_test_split, ClassificationReport, EncodedDataset,
    FeatureBuilder, ScoredMatrix,
};
use crate::stats::ClassDistribution;
use crate::utils::AnalysisError;

/// Runs load, clean, encode, evaluate and score as one batch
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

/// Everything one pipeline run produces
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub cleaning: CleaningSummary,
    pub class_distribution_before: ClassDistribution,
    pub class_distribution_after: ClassDistribution,
    pub feature_count: usize,
    /// Class names in code order
    pub classes: Vec<String>,
    pub report: ClassificationReport,
    pub top_features: Vec<(String, f64)>,
    pub outlier_count: usize,
    #[serde(skip)]
    pub scored: ScoredMatrix,
}

/// Row and class overview of a dataset before any modelling
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub record_count: usize,
    pub cleaning: CleaningSummary,
    pub class_distribution_before: ClassDistribution,
    pub class_distribution_after: ClassDistribution,
}

impl Pipeline {
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(config: PipelineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a CSV file and run every stage on it
    pub fn run_path(&self, path: &Path) -> Result<PipelineReport, AnalysisError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let dataset = {
            let _span = info_span!("load", path = %path.display()).entered();
            Dataset::from_path(name, path)?
        };
        self.run_dataset(dataset)
    }

    /// Run every stage on an already loaded dataset
    pub fn run_dataset(&self, dataset: Dataset) -> Result<PipelineReport, AnalysisError> {
        let target = self.config.features.target;
        let class_distribution_before = ClassDistribution::from_dataset(&dataset, target);

        let (cleaned, cleaning) = {
            let _span = info_span!("clean").entered();
            dataset.drop_missing()
        };
        let class_distribution_after = ClassDistribution::from_dataset(&cleaned, target);
        warn_on_vanished_classes(&class_distribution_before, &class_distribution_after);

        let encoded = {
            let _span = info_span!("encode").entered();
            FeatureBuilder::new(&self.config.features).build(&cleaned)?
        };

        let (report, top_features) = {
            let _span = info_span!("evaluate").entered();
            self.evaluate(&encoded)?
        };

        let feature_count = encoded.features.ncols();
        let classes = encoded.encoder.classes().to_vec();
        let scored = {
            let _span = info_span!("score").entered();
            self.score(encoded)?
        };

        info!(
            rows = scored.nrows(),
            features = feature_count,
            accuracy = report.accuracy,
            outliers = scored.outlier_count(),
            "pipeline finished"
        );

        Ok(PipelineReport {
            cleaning,
            class_distribution_before,
            class_distribution_after,
            feature_count,
            classes,
            report,
            top_features,
            outlier_count: scored.outlier_count(),
            scored,
        })
    }

    /// Split, fit the classifier on train, score it on test
    fn evaluate(
        &self,
        encoded: &EncodedDataset,
    ) -> Result<(ClassificationReport, Vec<(String, f64)>), AnalysisError> {
        let split = train_test_split(
            encoded.features.nrows(),
            self.config.split.test_ratio,
            self.config.split.seed,
        )?;
        let parts = split.apply(encoded.features.values(), &encoded.labels);
        ensure_multiclass("train", &parts.y_train)?;
        ensure_multiclass("test", &parts.y_test)?;

        let model = run_decision_tree(&parts.x_train, &parts.y_train, &self.config.tree)?;
        let predictions = predict_classes(&model, &parts.x_test);
        let report = ClassificationReport::compute(&parts.y_test, &predictions, &encoded.encoder)?;

        let top_features =
            top_feature_importances(&model, encoded.features.names(), self.config.top_features);
        info!(
            train = parts.y_train.len(),
            test = parts.y_test.len(),
            accuracy = report.accuracy,
            "classifier evaluated"
        );
        Ok((report, top_features))
    }

    /// Fit the isolation forest on every row and attach its outputs
    fn score(&self, encoded: EncodedDataset) -> Result<ScoredMatrix, AnalysisError> {
        let anomalies = run_isolation_forest(encoded.features.values(), &self.config.forest)?;

        let labels = encoded
            .labels
            .iter()
            .map(|&code| {
                encoded.encoder.decode(code).map(str::to_string).ok_or_else(|| {
                    AnalysisError::EncodingError(format!("unknown class code {}", code))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        ScoredMatrix::new(encoded.features, labels, anomalies.scores, anomalies.outliers)
    }

    /// Load, clean and summarize without modelling
    pub fn inspect(&self, dataset: &Dataset) -> DatasetSummary {
        summarize(dataset, self.config.features.target)
    }
}

/// Row counts and target distribution before and after cleaning
pub fn summarize(dataset: &Dataset, target: Column) -> DatasetSummary {
    let (cleaned, cleaning) = dataset.drop_missing();
    DatasetSummary {
        name: dataset.name.clone(),
        record_count: dataset.len(),
        cleaning,
        class_distribution_before: ClassDistribution::from_dataset(dataset, target),
        class_distribution_after: ClassDistribution::from_dataset(&cleaned, target),
    }
}

fn warn_on_vanished_classes(before: &ClassDistribution, after: &ClassDistribution) {
    for (class, count) in &before.counts {
        if after.count(class) == 0 {
            warn!(class = %class, rows_before = *count, "class lost entirely to cleaning");
        }
    }
}
