//! Pure normalizer functions: m/z binning, intensity normalization,
//! precursor binning, and the per-bin highest-peak filter.

pub mod intensity;
pub mod mzbinner;
pub mod per_bin_filter;
pub mod precursor;

pub use intensity::{
    BasicIntegerNormalizer, CumulativeIntensityNormalizer, IntensityNormalizer, LogNormalizer,
    MaxPeakNormalizer,
};
pub use mzbinner::{MzBinner, SequestBinner, TideBinner};
pub use per_bin_filter::HighestPeakPerBinFunction;
pub use precursor::{debin_precursor_mz, precursor_mz_bin, MZ_CONSTANT};
