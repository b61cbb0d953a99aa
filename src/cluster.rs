//! A cluster: member spectrum ids, incremental consensus, and the
//! bounded best-matches history used by the threshold assessor.

use std::collections::HashSet;

use log::warn;

use crate::consensus::ConsensusSpectrumState;
use crate::spectrum::BinarySpectrum;

/// Capacity of a cluster's best-matches history (§3).
pub const BEST_MATCHES_CAPACITY: usize = 30;

/// One recorded comparison outcome: the other side's id and the score.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMatch {
    pub other_id: String,
    pub similarity: f32,
}

/// A capacity-bounded sequence of [`ComparisonMatch`], kept sorted
/// ascending by similarity so the weakest entry is always at index 0
/// and the strongest is last.
#[derive(Debug, Clone, Default)]
pub struct BestMatches {
    entries: Vec<ComparisonMatch>,
}

impl BestMatches {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[ComparisonMatch] {
        &self.entries
    }

    /// The lowest remembered similarity, if any entries are present.
    pub fn min_best_sim(&self) -> Option<f32> {
        self.entries.first().map(|m| m.similarity)
    }

    /// Insert iff under capacity or better than the current minimum,
    /// maintaining ascending order and shrinking back to capacity by
    /// dropping the smallest. Returns whether the entry was kept.
    pub fn try_insert(&mut self, other_id: String, similarity: f32) -> bool {
        let qualifies = self.entries.len() < BEST_MATCHES_CAPACITY
            || self.min_best_sim().map(|m| similarity > m).unwrap_or(true);
        if !qualifies {
            return false;
        }
        let pos = self
            .entries
            .partition_point(|m| m.similarity < similarity);
        self.entries.insert(pos, ComparisonMatch { other_id, similarity });
        if self.entries.len() > BEST_MATCHES_CAPACITY {
            self.entries.remove(0);
        }
        true
    }

    /// Merge another sequence in, re-sort, truncate to capacity keeping
    /// the highest similarities (used by [`Cluster::merge`]).
    fn merge_from(&mut self, other: &BestMatches) {
        self.entries.extend(other.entries.iter().cloned());
        self.entries
            .sort_by(|a, b| a.similarity.partial_cmp(&b.similarity).unwrap_or(std::cmp::Ordering::Equal));
        if self.entries.len() > BEST_MATCHES_CAPACITY {
            let drop = self.entries.len() - BEST_MATCHES_CAPACITY;
            self.entries.drain(0..drop);
        }
    }

    fn from_parts(entries: Vec<ComparisonMatch>) -> Self {
        let mut out = Self { entries };
        out.entries
            .sort_by(|a, b| a.similarity.partial_cmp(&b.similarity).unwrap_or(std::cmp::Ordering::Equal));
        out
    }
}

/// A group of spectra hypothesized to originate from the same peptide
/// ion, summarized by an incrementally maintained consensus spectrum.
pub struct Cluster {
    id: String,
    member_ids: HashSet<String>,
    consensus: ConsensusSpectrumState,
    best_matches: BestMatches,
    best_match_id_index: Option<HashSet<String>>,
    n_comparisons: u32,
}

impl Cluster {
    /// A fresh cluster seeded with no members; `id` is the consensus uui.
    pub fn new(id: String, noise_filter_increment: i32) -> Self {
        let consensus = ConsensusSpectrumState::new(id.clone(), noise_filter_increment);
        Self {
            id,
            member_ids: HashSet::new(),
            consensus,
            best_matches: BestMatches::new(),
            best_match_id_index: None,
            n_comparisons: 0,
        }
    }

    /// Reconstruct from deserialized parts (see `store::codec`).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: String,
        member_ids: HashSet<String>,
        consensus: ConsensusSpectrumState,
        best_matches: Vec<ComparisonMatch>,
        noise_filter_increment: i32,
    ) -> Self {
        let _ = noise_filter_increment;
        Self {
            id,
            member_ids,
            consensus,
            best_matches: BestMatches::from_parts(best_matches),
            best_match_id_index: None,
            n_comparisons: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn member_ids(&self) -> &HashSet<String> {
        &self.member_ids
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn consensus(&self) -> &ConsensusSpectrumState {
        &self.consensus
    }

    pub fn precursor_mz_bin(&self) -> i32 {
        self.consensus.precursor_mz_bin()
    }

    /// Averaged integer charge across members, compared against an
    /// incoming spectrum's exact charge the same way two spectra would
    /// be compared (0 = wildcard on either side).
    pub fn precursor_charge(&self) -> i32 {
        self.consensus.precursor_charge()
    }

    pub fn n_comparisons(&self) -> u32 {
        self.n_comparisons
    }

    pub fn best_matches(&self) -> &BestMatches {
        &self.best_matches
    }

    /// The noise-filtered representative, lazily recomputed.
    pub fn representative_peaks(&mut self) -> (&[i32], &[i32]) {
        self.consensus.representative()
    }

    /// Fold survivors into the consensus, dropping any spectrum whose
    /// `uui` is already a member. Returns the number actually added.
    pub fn add_spectra(&mut self, spectra: &[BinarySpectrum]) -> usize {
        let mut added = 0;
        for s in spectra {
            if self.member_ids.contains(s.uui()) {
                warn!("duplicate spectrum {} ignored in cluster {}", s.uui(), self.id);
                continue;
            }
            self.member_ids.insert(s.uui().to_string());
            self.consensus.add(s);
            added += 1;
        }
        added
    }

    /// Record a comparison's outcome and increment the comparison
    /// counter, qualifying it into `bestMatches` per §4.5 step 5.
    pub fn save_comparison_result(&mut self, other_id: String, similarity: f32) {
        self.n_comparisons += 1;
        if self.best_matches.try_insert(other_id, similarity) {
            self.best_match_id_index = None;
        }
    }

    /// O(1) after a lazy index rebuild.
    pub fn is_in_best_matches(&mut self, id: &str) -> bool {
        self.best_match_id_index().contains(id)
    }

    /// The lazily rebuilt set of ids appearing in `bestMatches`.
    pub fn best_match_id_index(&mut self) -> &HashSet<String> {
        if self.best_match_id_index.is_none() {
            let index = self
                .best_matches
                .as_slice()
                .iter()
                .map(|m| m.other_id.clone())
                .collect();
            self.best_match_id_index = Some(index);
        }
        self.best_match_id_index.as_ref().expect("just built")
    }

    /// Absorb `other`'s members, consensus and best-matches history.
    /// The resulting id is whichever side has more members, keeping the
    /// larger cluster's consensus uui stable.
    pub fn merge(&mut self, other: &Cluster) {
        let overlap = self.member_ids.intersection(&other.member_ids).next().is_some();
        if overlap {
            warn!("overlapping member ids merging cluster {} into {}", other.id, self.id);
        }
        for id in &other.member_ids {
            self.member_ids.insert(id.clone());
        }
        self.consensus.merge(&other.consensus);
        self.best_matches.merge_from(&other.best_matches);
        self.best_match_id_index = None;

        if other.member_count() > self.member_count() {
            self.id = other.id.clone();
            self.consensus.set_uui(other.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(uui: &str) -> BinarySpectrum {
        BinarySpectrum::new(uui.to_string(), 500250, 2, vec![10, 20], vec![100, 200])
    }

    #[test]
    fn add_spectra_drops_duplicates() {
        let mut c = Cluster::new("c1".into(), 100);
        assert_eq!(c.add_spectra(&[spectrum("s1")]), 1);
        assert_eq!(c.add_spectra(&[spectrum("s1"), spectrum("s2")]), 1);
        assert_eq!(c.member_count(), 2);
    }

    #[test]
    fn best_matches_capacity_and_ordering() {
        let mut c = Cluster::new("c1".into(), 100);
        for i in 0..40 {
            c.save_comparison_result(format!("other{i}"), i as f32 / 40.0);
        }
        assert_eq!(c.best_matches().len(), BEST_MATCHES_CAPACITY);
        let sims: Vec<f32> = c.best_matches().as_slice().iter().map(|m| m.similarity).collect();
        let mut sorted = sims.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sims, sorted);
        assert_eq!(c.n_comparisons(), 40);
    }

    #[test]
    fn is_in_best_matches_after_recording() {
        let mut c = Cluster::new("c1".into(), 100);
        assert!(!c.is_in_best_matches("x"));
        c.save_comparison_result("x".into(), 0.9);
        assert!(c.is_in_best_matches("x"));
    }

    #[test]
    fn merge_relabels_to_larger_side_and_unions_members() {
        let mut small = Cluster::new("small".into(), 100);
        small.add_spectra(&[spectrum("s1")]);

        let mut large = Cluster::new("large".into(), 100);
        large.add_spectra(&[spectrum("s2"), spectrum("s3")]);

        small.merge(&large);
        assert_eq!(small.id(), "large");
        assert_eq!(small.member_count(), 3);
    }

    #[test]
    fn merge_keeps_smaller_side_label_when_it_has_more_members() {
        let mut big = Cluster::new("big".into(), 100);
        big.add_spectra(&[spectrum("s1"), spectrum("s2")]);

        let mut tiny = Cluster::new("tiny".into(), 100);
        tiny.add_spectra(&[spectrum("s3")]);

        big.merge(&tiny);
        assert_eq!(big.id(), "big");
    }
}
