//! Tagged result for statistics that may be undefined on degenerate rasters.

use std::fmt;

use serde::Serialize;

/// Why a statistic could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// No cell has both a valid elevation and a valid snow classification.
    NoValidArea,
    /// Every elevation cell is missing.
    AllElevationMissing,
    /// The elevation distribution is flat at its lower end (median equals minimum).
    FlatElevation,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoValidArea => "no valid area",
            Self::AllElevationMissing => "all elevation cells are missing",
            Self::FlatElevation => "elevation median equals minimum",
        };
        f.write_str(reason)
    }
}

/// A value that is either available or explicitly not available.
///
/// Distinct from a numeric zero so that callers cannot do arithmetic on a
/// placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
#[must_use]
pub enum Estimate<T> {
    /// The statistic was computed.
    Available(T),
    /// The statistic is undefined for this input.
    NotAvailable(Unavailable),
}

impl<T> Estimate<T> {
    /// Return `true` if a value is present.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Convert into an `Option`, discarding the reason.
    pub fn available(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::NotAvailable(_) => None,
        }
    }

    /// Return the reason the value is missing, if it is.
    pub fn reason(&self) -> Option<Unavailable> {
        match self {
            Self::Available(_) => None,
            Self::NotAvailable(reason) => Some(*reason),
        }
    }

    /// Borrow the inner value.
    pub fn as_ref(&self) -> Estimate<&T> {
        match self {
            Self::Available(v) => Estimate::Available(v),
            Self::NotAvailable(reason) => Estimate::NotAvailable(*reason),
        }
    }

    /// Map the available value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Self::Available(v) => Estimate::Available(f(v)),
            Self::NotAvailable(reason) => Estimate::NotAvailable(reason),
        }
    }

    /// Chain a computation that may itself be unavailable.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Estimate<U>) -> Estimate<U> {
        match self {
            Self::Available(v) => f(v),
            Self::NotAvailable(reason) => Estimate::NotAvailable(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_reason() {
        let e: Estimate<f64> = Estimate::NotAvailable(Unavailable::NoValidArea);
        let mapped = e.map(|v| v * 2.0);
        assert_eq!(mapped.reason(), Some(Unavailable::NoValidArea));
    }

    #[test]
    fn and_then_short_circuits() {
        let e = Estimate::Available(3.0).and_then(|_| {
            Estimate::<f64>::NotAvailable(Unavailable::AllElevationMissing)
        });
        assert!(!e.is_available());
        assert_eq!(e.reason(), Some(Unavailable::AllElevationMissing));
    }
}
