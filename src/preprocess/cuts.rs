use crate::data::model::ClusterTable;
use crate::error::PrepResult;

// ---------------------------------------------------------------------------
// Cut: a row-exclusion predicate on one column
// ---------------------------------------------------------------------------

/// Excludes every cluster whose `column` value is `<= threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut {
    pub column: &'static str,
    pub threshold: f64,
}

impl Cut {
    pub const fn at_most(column: &'static str, threshold: f64) -> Self {
        Self { column, threshold }
    }

    /// NaN never compares `<=`, so NaN values are not excluded.
    pub fn excludes(&self, value: f64) -> bool {
        value <= self.threshold
    }
}

/// Quality cuts, in application order.
pub const CLUSTER_CUTS: [Cut; 6] = [
    Cut::at_most("clusterE", 0.0),
    Cut::at_most("cluster_ENG_CALIB_TOT", 0.3),
    Cut::at_most("cluster_CENTER_LAMBDA", 0.0),
    Cut::at_most("cluster_FIRST_ENG_DENS", 0.0),
    Cut::at_most("cluster_SECOND_TIME", 0.0),
    Cut::at_most("cluster_SIGNIFICANCE", 0.0),
];

/// Cut-only column removed once the cuts are applied.
pub const CUT_ONLY_COLUMN: &str = "cluster_SIGNIFICANCE";

// ---------------------------------------------------------------------------
// Applying the cuts
// ---------------------------------------------------------------------------

/// What the selector did to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CutSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows matched by each cut, counted independently (a row can match
    /// several cuts).
    pub matched: Vec<(&'static str, usize)>,
}

/// Mask of rows that pass every cut.
///
/// A row passes when no cut excludes it. All referenced columns are
/// resolved first, so a missing column is reported before any work.
pub fn surviving_rows(table: &ClusterTable, cuts: &[Cut]) -> PrepResult<(Vec<bool>, Vec<usize>)> {
    let columns = cuts
        .iter()
        .map(|cut| table.column(cut.column))
        .collect::<PrepResult<Vec<_>>>()?;

    let mut keep = vec![true; table.len()];
    let mut matched = vec![0usize; cuts.len()];

    for (cut_idx, (cut, values)) in cuts.iter().zip(&columns).enumerate() {
        for (row, &value) in values.iter().enumerate() {
            if cut.excludes(value) {
                keep[row] = false;
                matched[cut_idx] += 1;
            }
        }
    }

    Ok((keep, matched))
}

/// Remove every cluster excluded by any of [`CLUSTER_CUTS`], then drop
/// [`CUT_ONLY_COLUMN`].
pub fn apply_cuts(table: &mut ClusterTable) -> PrepResult<CutSummary> {
    table.require([CUT_ONLY_COLUMN])?;
    let (keep, matched) = surviving_rows(table, &CLUSTER_CUTS)?;

    let rows_before = table.len();
    table.retain_rows(&keep)?;
    table.drop_column(CUT_ONLY_COLUMN)?;

    let summary = CutSummary {
        rows_before,
        rows_after: table.len(),
        matched: CLUSTER_CUTS
            .iter()
            .map(|cut| cut.column)
            .zip(matched)
            .collect(),
    };

    for (column, count) in &summary.matched {
        log::debug!("cut on {column}: {count} rows matched");
    }

    Ok(summary)
}
