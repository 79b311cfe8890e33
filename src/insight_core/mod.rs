/// Feature encoding, evaluation and anomaly scoring
pub mod feature;
pub mod isolation;
pub mod label;
pub mod metrics;
pub mod model;
pub mod split;

// Re-export commonly used types and functions
pub use feature::{EncodedDataset, FeatureBuilder, FeatureMatrix, IndicatorGroup, ScoredMatrix};
pub use isolation::isolation_scores;
pub use label::LabelEncoder;
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use model::{
    predict_classes, run_decision_tree, run_isolation_forest, top_feature_importances,
    AnomalyScores,
};
pub use split::{ensure_multiclass, train_test_split, Partitions, SplitIndices};
