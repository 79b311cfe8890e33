use super::error::AnalysisError;

/// Validate a ratio lies strictly inside (0, 1)
///
/// # Arguments
/// * `name` - Parameter name used in the error message
/// * `value` - The ratio to validate
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(AnalysisError::ValidationError)` if out of range
pub fn validate_ratio(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(AnalysisError::ValidationError(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate a contamination rate lies in (0, 0.5]
pub fn validate_contamination(contamination: f64) -> Result<(), AnalysisError> {
    if !(contamination > 0.0 && contamination <= 0.5) {
        return Err(AnalysisError::ValidationError(format!(
            "contamination must be in (0, 0.5], got {}",
            contamination
        )));
    }
    Ok(())
}

/// Percentile with linear interpolation between closest ranks
///
/// # Arguments
/// * `values` - Sample values, any order
/// * `q` - Percentile in [0, 100]
///
/// # Returns
/// * `None` for an empty sample
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Safe division returning 0.0 when the denominator is zero
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
