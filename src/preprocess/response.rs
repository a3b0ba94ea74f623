use crate::data::model::ClusterTable;
use crate::error::PrepResult;

pub const RESPONSE_NUMERATOR: &str = "clusterE";
pub const RESPONSE_DENOMINATOR: &str = "cluster_ENG_CALIB_TOT";
pub const RESPONSE_COLUMN: &str = "cluster_response";

/// Reconstructed over calibrated energy. A zero or non-finite calibration
/// energy yields NaN.
pub fn response(energy: f64, calib: f64) -> f64 {
    if calib == 0.0 || !calib.is_finite() {
        f64::NAN
    } else {
        energy / calib
    }
}

/// Append `cluster_response = clusterE / cluster_ENG_CALIB_TOT` and drop the
/// calibration column.
pub fn compute_response(table: &mut ClusterTable) -> PrepResult<()> {
    table.require([RESPONSE_NUMERATOR, RESPONSE_DENOMINATOR])?;

    let values: Vec<f64> = table
        .column(RESPONSE_NUMERATOR)?
        .iter()
        .zip(table.column(RESPONSE_DENOMINATOR)?)
        .map(|(&e, &calib)| response(e, calib))
        .collect();

    table.push_column(RESPONSE_COLUMN, values)?;
    table.drop_column(RESPONSE_DENOMINATOR)?;
    Ok(())
}
