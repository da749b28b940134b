//! Percentiles of the valid elevation samples.

use crate::estimate::{Estimate, Unavailable};

/// Sorted non-missing elevation values.
#[derive(Debug, Clone)]
pub struct ElevationSamples {
    sorted: Vec<f64>,
}

impl ElevationSamples {
    /// Collect and sort every finite value.
    ///
    /// Returns [`Unavailable::AllElevationMissing`] if nothing remains.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Estimate<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Estimate::NotAvailable(Unavailable::AllElevationMissing);
        }
        sorted.sort_by(f64::total_cmp);
        Estimate::Available(Self { sorted })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.sorted[0]
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }

    #[must_use]
    pub fn median(&self) -> f64 {
        self.percentile(0.5)
    }

    /// Percentile `p` (a fraction in `[0, 1]`, clamped) with linear
    /// interpolation between the order statistics at rank `p * (n - 1)`.
    #[must_use]
    pub fn percentile(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        let rank = p * (self.sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as f64;
        let (a, b) = (self.sorted[lo], self.sorted[hi]);
        a + (b - a) * frac
    }
}
