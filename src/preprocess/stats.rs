//! Column reductions shared by the transforms.
//!
//! NaN entries are skipped, and the standard deviation uses Bessel's
//! correction (n - 1).

/// Mean and sample standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std: f64,
    /// Number of non-NaN values that entered the reduction.
    pub count: usize,
}

impl Moments {
    pub fn of(values: &[f64]) -> Self {
        let mean = mean(values);
        let (sum_sq, count) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(acc, n), &v| {
                let diff = v - mean;
                (acc + diff * diff, n + 1)
            });

        let std = if count < 2 {
            f64::NAN
        } else {
            (sum_sq / (count - 1) as f64).sqrt()
        };

        Self { mean, std, count }
    }

    /// A zero or non-finite spread makes standardisation meaningless.
    pub fn is_degenerate(&self) -> bool {
        !self.std.is_finite() || self.std == 0.0
    }
}

/// Mean of the non-NaN values; NaN when there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(acc, n), &v| (acc + v, n + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Smallest non-NaN value, `None` for an all-NaN or empty column.
pub fn min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
}
