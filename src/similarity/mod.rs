//! Spectrum-to-spectrum similarity scoring (§4.3).

pub mod combined;
pub mod fisher;
pub mod kendall;

pub use combined::CombinedFisherIntensityTest;
pub use fisher::fisher_share_score;
pub use kendall::kendall_tau_b_pairs;

/// A similarity score between two binarized, bin-sorted spectra, in
/// `[0, 1]`. `universe` is the total number of distinct m/z bins observed
/// across the comparison's context (see [`crate::engine`] for how it is
/// derived).
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a_mz: &[i32], a_intensity: &[i32], b_mz: &[i32], b_intensity: &[i32], universe: u32) -> f64;
}
