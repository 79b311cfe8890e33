use std::fmt;

/// Error type shared by every pipeline stage
///
/// Every variant is fatal for the run: the pipeline never retries and never
/// degrades to a partial result.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input file missing, unreadable or malformed
    InputError(String),
    /// No rows left to work with (typically after cleaning)
    EmptyInputError(String),
    /// Train or test partition empty or holding a single class
    DegenerateSplitError(String),
    /// A column cannot be encoded for the role it was given
    EncodingError(String),
    /// Invalid configuration values
    ValidationError(String),
    /// Model training/prediction errors
    ModelError(String),
    /// Arrow-related errors (schema, batch assembly, IPC writing)
    ArrowError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InputError(msg) => write!(f, "InputError: {}", msg),
            AnalysisError::EmptyInputError(msg) => write!(f, "EmptyInputError: {}", msg),
            AnalysisError::DegenerateSplitError(msg) => {
                write!(f, "DegenerateSplitError: {}", msg)
            }
            AnalysisError::EncodingError(msg) => write!(f, "EncodingError: {}", msg),
            AnalysisError::ValidationError(msg) => write!(f, "ValidationError: {}", msg),
            AnalysisError::ModelError(msg) => write!(f, "ModelError: {}", msg),
            AnalysisError::ArrowError(msg) => write!(f, "ArrowError: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::InputError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InputError("missing file".to_string());
        assert_eq!(err.to_string(), "InputError: missing file");

        let err = AnalysisError::EmptyInputError("no rows".to_string());
        assert_eq!(err.to_string(), "EmptyInputError: no rows");

        let err = AnalysisError::DegenerateSplitError("empty test".to_string());
        assert_eq!(err.to_string(), "DegenerateSplitError: empty test");

        let err = AnalysisError::EncodingError("bad column".to_string());
        assert_eq!(err.to_string(), "EncodingError: bad column");

        let err = AnalysisError::ModelError("model test".to_string());
        assert_eq!(err.to_string(), "ModelError: model test");
    }

    #[test]
    fn test_csv_error_maps_to_input_error() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader("a,b\n1,2,3\n".as_bytes());
        let err = reader
            .records()
            .next()
            .unwrap()
            .map_err(AnalysisError::from)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InputError(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<AnalysisError>();
        assert_sync::<AnalysisError>();
    }
}
