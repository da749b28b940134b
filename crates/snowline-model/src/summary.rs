//! Box-plot style summary of a sample distribution.

use serde::Serialize;

/// Location, spread, and Tukey fences of a sample.
///
/// Quantiles use linear interpolation at rank `q·(n−1)`; `std` is the
/// population standard deviation (ddof = 0). Whiskers are the most extreme
/// samples within 1.5·IQR of the quartiles; anything beyond is an outlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    /// Samples outside the whiskers, ascending.
    pub outliers: Vec<f64>,
}

impl DistributionSummary {
    /// Summarize `values`. Returns `None` when empty or when any value is NaN.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| v.is_nan()) {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std = (sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (fence_low, fence_high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = || sorted.iter().copied().filter(|&v| v >= fence_low && v <= fence_high);
        let whisker_low = inside().next().unwrap_or(q1);
        let whisker_high = inside().last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < fence_low || v > fence_high)
            .collect();

        Some(Self {
            mean,
            std,
            median,
            q1,
            q3,
            iqr,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Linearly interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
