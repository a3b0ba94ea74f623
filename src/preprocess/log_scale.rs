//! Shift-safe log10 scaling.
//!
//! A column whose minimum is `<= 0` is shifted by `|min| + 1e-12` before the
//! log, so its minimum maps to `log10(1e-12)`. The decision is taken per
//! column and per table.

use crate::data::model::ClusterTable;
use crate::error::PrepResult;

use super::stats;

/// Offset added on top of `|min|` for non-positive columns.
pub const LOG_SHIFT_EPSILON: f64 = 1e-12;

/// How a column was mapped to log space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogScaling {
    /// Strictly positive column, plain `log10(x)`.
    Direct,
    /// `log10(x + shift)`.
    Shifted(f64),
}

impl LogScaling {
    pub fn shift(&self) -> f64 {
        match self {
            LogScaling::Direct => 0.0,
            LogScaling::Shifted(shift) => *shift,
        }
    }

    /// Map a log-scaled value back to the original scale.
    pub fn invert(&self, y: f64) -> f64 {
        10f64.powf(y) - self.shift()
    }
}

/// Log-scale one column in place.
///
/// Shifted values are computed as `(x - min) + 1e-12`, so the minimum lands
/// on exactly `log10(1e-12)` even when `|min|` would swallow the epsilon.
pub fn log_scale(values: &mut [f64]) -> LogScaling {
    match stats::min(values) {
        Some(min_val) if min_val <= 0.0 => {
            values
                .iter_mut()
                .for_each(|v| *v = ((*v - min_val) + LOG_SHIFT_EPSILON).log10());
            LogScaling::Shifted(min_val.abs() + LOG_SHIFT_EPSILON)
        }
        _ => {
            values.iter_mut().for_each(|v| *v = v.log10());
            LogScaling::Direct
        }
    }
}

/// Log-scale every listed feature. All names are checked before any column
/// is touched.
pub fn apply_log(table: &mut ClusterTable, features: &[String]) -> PrepResult<Vec<(String, LogScaling)>> {
    table.require(features.iter().map(String::as_str))?;

    let mut applied = Vec::with_capacity(features.len());
    for feature in features {
        let scaling = log_scale(table.column_mut(feature)?);
        if let LogScaling::Shifted(shift) = scaling {
            log::warn!("Shifting '{feature}' by {shift} before log transform to avoid non-positive values");
        }
        applied.push((feature.clone(), scaling));
    }
    Ok(applied)
}
