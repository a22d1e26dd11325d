//! Conversion of a metric value into an integer scaling signal

use crate::error::{Result, ScalerError};

/// Round half away from zero and narrow to `i32`.
///
/// Values outside the `i32` range (and NaN) are rejected rather than
/// clamped, so a saturated reading is never mistaken for a real one.
pub fn round_signal(metric: &str, value: f64) -> Result<i32> {
    let rounded = value.round();

    if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(ScalerError::SignalOutOfRange {
            metric: metric.to_string(),
            value,
        });
    }

    Ok(rounded as i32)
}
