//! Raw-peak loading filters, composed left-to-right before binarization.
//!
//! This is the one open extension point among the closed-variant sets
//! (normalizers, predicates): third parties can plug in their own
//! [`SpectrumFilter`] alongside the three provided here.

use crate::spectrum::Peak;

/// A single step in the raw-peak filter chain.
pub trait SpectrumFilter: Send + Sync {
    /// Apply the filter, returning the surviving peaks.
    fn apply(&self, precursor_mz: f64, precursor_charge: i32, peaks: Vec<Peak>) -> Vec<Peak>;
}

/// Drops peaks with `mz > precursor_mz * charge + tolerance`. An unknown
/// charge (0) is treated as singly charged for this bound, since the
/// alternative (threshold collapsing to `precursor_mz + tolerance`) would
/// reject nearly every fragment of a multiply-charged precursor.
#[derive(Debug, Clone, Copy)]
pub struct RemoveImpossiblyHighPeaks {
    pub tolerance: f64,
}

impl Default for RemoveImpossiblyHighPeaks {
    fn default() -> Self {
        Self { tolerance: 1.5 }
    }
}

impl SpectrumFilter for RemoveImpossiblyHighPeaks {
    fn apply(&self, precursor_mz: f64, precursor_charge: i32, peaks: Vec<Peak>) -> Vec<Peak> {
        let charge = precursor_charge.max(1) as f64;
        let max_mz = precursor_mz * charge + self.tolerance;
        peaks.into_iter().filter(|p| p.mz <= max_mz).collect()
    }
}

/// Drops peaks within `window_da` of `precursor_mz ± k/charge` for small
/// isotope offsets `k` (0, 1, 2). An unknown charge (0) is treated as
/// singly charged, matching [`RemoveImpossiblyHighPeaks`].
#[derive(Debug, Clone, Copy)]
pub struct RemovePrecursorPeaks {
    pub window_da: f64,
}

impl SpectrumFilter for RemovePrecursorPeaks {
    fn apply(&self, precursor_mz: f64, precursor_charge: i32, peaks: Vec<Peak>) -> Vec<Peak> {
        let charge = precursor_charge.max(1) as f64;
        let excluded: Vec<f64> = (0..=2)
            .map(|k| precursor_mz + k as f64 / charge)
            .chain((0..=2).map(|k| precursor_mz - k as f64 / charge))
            .collect();
        peaks
            .into_iter()
            .filter(|p| excluded.iter().all(|&e| (p.mz - e).abs() > self.window_da))
            .collect()
    }
}

/// Retains the `n` largest peaks by intensity; ties broken by lowest m/z.
/// Output is re-sorted ascending by m/z.
#[derive(Debug, Clone, Copy)]
pub struct KeepNHighestRawPeaks {
    pub n: usize,
}

impl Default for KeepNHighestRawPeaks {
    fn default() -> Self {
        Self { n: 40 }
    }
}

impl SpectrumFilter for KeepNHighestRawPeaks {
    fn apply(&self, _precursor_mz: f64, _precursor_charge: i32, mut peaks: Vec<Peak>) -> Vec<Peak> {
        peaks.sort_by(|a, b| {
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.mz.partial_cmp(&b.mz).unwrap_or(std::cmp::Ordering::Equal))
        });
        peaks.truncate(self.n);
        peaks.sort_by(|a, b| a.mz.partial_cmp(&b.mz).unwrap_or(std::cmp::Ordering::Equal));
        peaks
    }
}

/// An ordered chain of [`SpectrumFilter`]s, applied left to right.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn SpectrumFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, filter: impl SpectrumFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn apply(&self, precursor_mz: f64, precursor_charge: i32, mut peaks: Vec<Peak>) -> Vec<Peak> {
        for filter in &self.filters {
            peaks = filter.apply(precursor_mz, precursor_charge, peaks);
        }
        peaks
    }
}
