use ndarray::Array2;

use crate::utils::AnalysisError;

/// Apply MinMax scaling: (x - min) / (max - min)
///
/// # Arguments
/// * `features` - Feature matrix to scale
///
/// # Returns
/// * `Ok(scaled)` - Scaled feature matrix with values in [0, 1]
/// * `Err(AnalysisError)` - If the matrix holds NaN or Inf
///
/// # Note
/// Constant columns are set to 0.0. Bounds are taken on halved values, so
/// columns spanning most of the f64 range do not overflow.
pub fn min_max_scale(features: &Array2<f64>) -> Result<Array2<f64>, AnalysisError> {
    if features.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::ValidationError(
            "cannot scale NaN or Inf values".to_string(),
        ));
    }

    let mut scaled = features.clone();
    for mut col in scaled.columns_mut() {
        let (min, max) = col
            .iter()
            .map(|v| v * 0.5)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;

        if range > 0.0 {
            col.mapv_inplace(|v| ((v * 0.5 - min) / range).clamp(0.0, 1.0));
        } else {
            // Constant column, set all values to 0
            col.fill(0.0);
        }
    }

    Ok(scaled)
}
