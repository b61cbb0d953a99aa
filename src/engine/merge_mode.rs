//! Merge-mode entry point: clustering clusters from a previous pass
//! instead of raw spectra, using the same candidate-window/score/decide
//! protocol but `mergeCluster` in place of `addSpectra` (§4.5).

use super::{charge_compatible, pick_best, union_bin_count, GreedyClusteringEngine};
use crate::similarity::SimilarityScorer;

impl<S: SimilarityScorer> GreedyClusteringEngine<S> {
    /// Process one cluster from a previous clustering pass. Returns the
    /// id of the cluster it ended up merged into (or its own id, if it
    /// was inserted as a new entry).
    pub fn process_cluster(&mut self, mut incoming: crate::cluster::Cluster) -> String {
        if self.poll_cancel() {
            return String::new();
        }

        let bin = incoming.precursor_mz_bin();
        self.evict_below(bin - self.config.precursor_tolerance_bins);

        let incoming_id = incoming.id().to_string();
        let (incoming_mz, incoming_intensity) = {
            let peaks = incoming.representative_peaks();
            (peaks.0.to_vec(), peaks.1.to_vec())
        };
        let incoming_best_ids = incoming.best_match_id_index().clone();

        let range = self.window_range(bin);
        let mut scored = Vec::new();
        for idx in range {
            if self.active[idx].id() == incoming_id {
                // Self-comparison is excluded: the same cluster must
                // never be compared against itself in merge mode.
                continue;
            }
            if !charge_compatible(self.active[idx].precursor_charge(), incoming.precursor_charge()) {
                continue;
            }

            let (candidate_mz, candidate_intensity, candidate_best_ids) = {
                let c = &mut self.active[idx];
                let (mz, intensity) = c.representative_peaks();
                let mz = mz.to_vec();
                let intensity = intensity.to_vec();
                (mz, intensity, c.best_match_id_index().clone())
            };

            let candidate_view = crate::predicate::ClusterView {
                id: self.active[idx].id(),
                mz: &candidate_mz,
                intensity: &candidate_intensity,
                best_match_ids: &candidate_best_ids,
            };
            let incoming_view = crate::predicate::ClusterView {
                id: &incoming_id,
                mz: &incoming_mz,
                intensity: &incoming_intensity,
                best_match_ids: &incoming_best_ids,
            };

            if let Some(filter) = &self.comparison_filter_predicate {
                if filter.accept(&candidate_view, &incoming_view) {
                    continue;
                }
            }
            if !self.cluster_predicate.accept(&candidate_view, &incoming_view) {
                continue;
            }

            let universe = union_bin_count(&candidate_mz, &incoming_mz);
            let sigma = self
                .scorer
                .score(&candidate_mz, &candidate_intensity, &incoming_mz, &incoming_intensity, universe)
                as f32;

            self.active[idx].save_comparison_result(incoming_id.clone(), sigma);
            incoming.save_comparison_result(self.active[idx].id().to_string(), sigma);
            scored.push((idx, sigma));
        }

        let best = scored
            .iter()
            .filter(|&&(idx, sigma)| {
                let t = self.assessor.threshold(self.active[idx].n_comparisons());
                sigma >= t
            })
            .copied()
            .collect::<Vec<_>>();
        let chosen = pick_best(&self.active, &best);

        match chosen {
            Some(idx) => {
                // `merge` may relabel `c` to `incoming`'s id (§4.7) if the
                // incoming side has more members, so the final id must be
                // read back from inside the mutation, not captured before it.
                let mut merged_id = String::new();
                self.reposition(idx, |c| {
                    c.merge(&incoming);
                    merged_id = c.id().to_string();
                });
                merged_id
            }
            None => {
                self.insert_sorted(incoming);
                incoming_id
            }
        }
    }
}
