//! The combined Fisher/intensity similarity test used by the clustering
//! engine to score candidate cluster/spectrum pairs (§4.3).

use super::fisher::fisher_share_score;
use super::kendall::kendall_tau_b_pairs;
use super::SimilarityScorer;

/// Combines Fisher's exact test over shared peak bins with Kendall's
/// tau-b over the shared bins' intensities: `fisher * (1 + max(0, tau)) / 2`.
/// Discordant or untested rank agreement (tau <= 0, or fewer than two
/// shared pairs to rank) floors the result at half the raw Fisher score
/// rather than penalizing below it, since a pair that shares many peaks
/// but disagrees on their relative ranking is still a better candidate
/// than one sharing few peaks.
#[derive(Debug, Clone, Copy)]
pub struct CombinedFisherIntensityTest {
    /// Bin-distance tolerance when matching peaks between the two spectra.
    pub peak_match_tolerance: i32,
}

impl Default for CombinedFisherIntensityTest {
    fn default() -> Self {
        Self {
            peak_match_tolerance: 0,
        }
    }
}

impl CombinedFisherIntensityTest {
    /// Walk two sorted (mz_bin, intensity) spectra and collect the
    /// intensity pairs at matching bins, plus the shared-bin count.
    fn matched_pairs(&self, a_mz: &[i32], a_int: &[i32], b_mz: &[i32], b_int: &[i32]) -> (Vec<i32>, Vec<i32>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut i = 0;
        let mut j = 0;
        while i < a_mz.len() && j < b_mz.len() {
            let diff = a_mz[i] - b_mz[j];
            if diff.abs() <= self.peak_match_tolerance {
                xs.push(a_int[i]);
                ys.push(b_int[j]);
                i += 1;
                j += 1;
            } else if diff < 0 {
                i += 1;
            } else {
                j += 1;
            }
        }
        (xs, ys)
    }
}

impl SimilarityScorer for CombinedFisherIntensityTest {
    fn score(&self, a_mz: &[i32], a_int: &[i32], b_mz: &[i32], b_int: &[i32], universe: u32) -> f64 {
        let (xs, ys) = self.matched_pairs(a_mz, a_int, b_mz, b_int);
        let shared = xs.len() as u32;
        let fisher = fisher_share_score(shared, a_mz.len() as u32, b_mz.len() as u32, universe);
        if xs.len() < 2 {
            // Fewer than two shared pairs: tau-b is undefined (zero
            // denominator), but the formula's tau term is still well
            // defined at tau=0, so apply it directly instead of
            // special-casing away the halving.
            return (fisher * 0.5).clamp(0.0, 1.0);
        }
        let tau = kendall_tau_b_pairs(&xs, &ys);
        (fisher * (1.0 + tau.max(0.0)) / 2.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_spectra_score_highly() {
        let scorer = CombinedFisherIntensityTest::default();
        let mz = vec![1, 2, 3, 4, 5];
        let intensity = vec![10, 20, 30, 40, 50];
        let score = scorer.score(&mz, &intensity, &mz, &intensity, 1000);
        assert!(score > 0.8, "score={score}");
    }

    #[test]
    fn disjoint_spectra_score_zero() {
        let scorer = CombinedFisherIntensityTest::default();
        let a_mz = vec![1, 2, 3];
        let a_int = vec![10, 20, 30];
        let b_mz = vec![100, 200, 300];
        let b_int = vec![10, 20, 30];
        let score = scorer.score(&a_mz, &a_int, &b_mz, &b_int, 1000);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn discordant_intensities_score_no_higher_than_share_alone() {
        let scorer = CombinedFisherIntensityTest::default();
        let mz = vec![1, 2, 3, 4];
        let a_int = vec![10, 20, 30, 40];
        let b_int = vec![40, 30, 20, 10];
        let concordant = scorer.score(&mz, &a_int, &mz, &a_int, 1000);
        let discordant = scorer.score(&mz, &a_int, &mz, &b_int, 1000);
        assert!(discordant <= concordant);
    }

    #[test]
    fn tolerance_matches_neighboring_bins() {
        let scorer = CombinedFisherIntensityTest {
            peak_match_tolerance: 1,
        };
        let a_mz = vec![10, 20, 30];
        let b_mz = vec![11, 19, 31];
        let intensity = vec![5, 5, 5];
        let score = scorer.score(&a_mz, &intensity, &b_mz, &intensity, 1000);
        assert!(score > 0.0);
    }
}
