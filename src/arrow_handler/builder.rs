use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::insight_core::ScoredMatrix;
use crate::utils::AnalysisError;

/// Name of the decoded target column in exported batches
pub const LABEL_COLUMN: &str = "attack_type";

/// Build an Arrow batch from a scored feature matrix
///
/// # Arguments
/// * `scored` - Feature matrix with per-row labels, scores and outlier flags
///
/// # Returns
/// * `Ok(RecordBatch)` - Feature columns, then `attack_type`, `anomaly_score`, `is_outlier`
/// * `Err(AnalysisError)` - If building fails
pub fn build_scored_batch(scored: &ScoredMatrix) -> Result<RecordBatch, AnalysisError> {
    let features = scored.features.values();
    let names = scored.features.names();

    let mut fields = Vec::with_capacity(names.len() + 3);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len() + 3);

    for (i, name) in names.iter().enumerate() {
        fields.push(Field::new(name.as_str(), DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(features.column(i).to_vec())) as ArrayRef);
    }

    // Order fixed after the features: attack_type, anomaly_score, is_outlier
    fields.push(Field::new(LABEL_COLUMN, DataType::Utf8, false));
    fields.push(Field::new(ScoredMatrix::SCORE_COLUMN, DataType::Float64, false));
    fields.push(Field::new(ScoredMatrix::OUTLIER_COLUMN, DataType::Boolean, false));
    columns.push(Arc::new(StringArray::from(scored.labels.clone())) as ArrayRef);
    columns.push(Arc::new(Float64Array::from(scored.scores.clone())) as ArrayRef);
    columns.push(Arc::new(BooleanArray::from(scored.outliers.clone())) as ArrayRef);

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, columns)
        .map_err(|e| AnalysisError::ArrowError(format!("failed to create RecordBatch: {}", e)))
}

/// Serialize RecordBatch to Arrow IPC Stream format
pub fn serialize_to_ipc(batch: &RecordBatch) -> Result<Vec<u8>, AnalysisError> {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buffer, &batch.schema()).map_err(|e| {
            AnalysisError::ArrowError(format!("failed to create StreamWriter: {}", e))
        })?;
        writer
            .write(batch)
            .map_err(|e| AnalysisError::ArrowError(format!("failed to write batch: {}", e)))?;
        writer
            .finish()
            .map_err(|e| AnalysisError::ArrowError(format!("failed to finish writer: {}", e)))?;
    }
    Ok(buffer)
}

/// Write the scored matrix to `path` as an Arrow IPC stream
pub fn write_scored_ipc(path: &Path, scored: &ScoredMatrix) -> Result<(), AnalysisError> {
    let batch = build_scored_batch(scored)?;
    let bytes = serialize_to_ipc(&batch)?;
    fs::write(path, &bytes).map_err(|e| {
        AnalysisError::ArrowError(format!("cannot write '{}': {}", path.display(), e))
    })?;

    info!(
        path = %path.display(),
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "exported scored matrix"
    );
    Ok(())
}
