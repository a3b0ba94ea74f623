//! Standardisation of feature columns and of the cluster time.
//!
//! Two sign conventions coexist on purpose:
//!
//! ```text
//! feature columns : (mean - x) / std
//! cluster_time    : (t - mean) / std,   t = sign(x) * |x|^(1/3)
//! ```
//!
//! A zero or non-finite std is not guarded: the column turns into inf/NaN
//! and a warning is logged.

use crate::data::model::ClusterTable;
use crate::error::PrepResult;

use super::stats::Moments;

/// Column that receives the signed cube-root transform.
pub const TIME_FEATURE: &str = "cluster_time";

/// Replace every value with `(mean - x) / std`.
pub fn standardise_inverted(values: &mut [f64]) -> Moments {
    let moments = Moments::of(values);
    values
        .iter_mut()
        .for_each(|v| *v = (moments.mean - *v) / moments.std);
    moments
}

/// Replace every value with `(x - mean) / std`.
pub fn standardise(values: &mut [f64]) -> Moments {
    let moments = Moments::of(values);
    values
        .iter_mut()
        .for_each(|v| *v = (*v - moments.mean) / moments.std);
    moments
}

/// Signed cube root followed by conventional standardisation.
pub fn time_transform(values: &mut [f64]) -> Moments {
    values.iter_mut().for_each(|v| *v = v.cbrt());
    standardise(values)
}

fn warn_if_degenerate(feature: &str, moments: &Moments) {
    if moments.is_degenerate() {
        log::warn!(
            "'{feature}' has std {} over {} values, standardised values are not finite",
            moments.std,
            moments.count
        );
    }
}

/// Standardise every listed feature with the inverted convention. All names
/// are checked before any column is touched.
pub fn apply_standardisation(table: &mut ClusterTable, features: &[String]) -> PrepResult<Vec<(String, Moments)>> {
    table.require(features.iter().map(String::as_str))?;

    let mut applied = Vec::with_capacity(features.len());
    for feature in features {
        let moments = standardise_inverted(table.column_mut(feature)?);
        log::debug!("'{feature}': mean {} std {}", moments.mean, moments.std);
        warn_if_degenerate(feature, &moments);
        applied.push((feature.clone(), moments));
    }
    Ok(applied)
}

/// Apply [`time_transform`] to [`TIME_FEATURE`].
pub fn apply_time_transform(table: &mut ClusterTable) -> PrepResult<Moments> {
    let moments = time_transform(table.column_mut(TIME_FEATURE)?);
    log::debug!(
        "'{TIME_FEATURE}' (cube root): mean {} std {}",
        moments.mean,
        moments.std
    );
    warn_if_degenerate(TIME_FEATURE, &moments);
    Ok(moments)
}
