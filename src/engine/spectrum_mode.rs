//! Spectrum-mode entry point: feeding individual spectra into the
//! engine (the normal, single-pass clustering mode).

use std::collections::HashSet;

use super::{charge_compatible, pick_best, union_bin_count, GreedyClusteringEngine};
use crate::cluster::Cluster;
use crate::predicate::ClusterView;
use crate::similarity::SimilarityScorer;
use crate::spectrum::{new_uui, BinarySpectrum};

impl<S: SimilarityScorer> GreedyClusteringEngine<S> {
    /// Buffer one already-binarized, per-bin-filtered spectrum for
    /// insertion. The reader yields spectra in file order, but the core
    /// does not trust that order (§4.5, §6): `spectrum` is only queued
    /// here, and is actually scored against `active` and inserted once
    /// [`Self::finish`] sorts the whole buffer ascending by precursor
    /// bin and replays it, so the emitted stream stays non-decreasing
    /// in precursor bin regardless of arrival order.
    pub fn process_spectrum(&mut self, spectrum: BinarySpectrum) {
        self.pending.push(spectrum);
    }

    /// The actual §4.5 insert/evict/score/decide step for one spectrum,
    /// already in its correct precursor-bin-sorted position relative to
    /// everything else in this run. Returns the id of the cluster
    /// `spectrum` ended up in. Called only from [`super::GreedyClusteringEngine::drain_pending`].
    pub(super) fn insert_sorted_spectrum(&mut self, spectrum: BinarySpectrum) -> String {
        let bin = spectrum.precursor_mz_bin();
        self.evict_below(bin - self.config.precursor_tolerance_bins);

        let empty_best: HashSet<String> = HashSet::new();
        let spectrum_view = ClusterView {
            id: spectrum.uui(),
            mz: spectrum.mz(),
            intensity: spectrum.intensity(),
            best_match_ids: &empty_best,
        };

        let range = self.window_range(bin);
        let mut scored = Vec::new();
        for idx in range {
            if !charge_compatible(self.active[idx].precursor_charge(), spectrum.precursor_charge()) {
                continue;
            }
            let candidate_view = {
                let c = &mut self.active[idx];
                let (mz, intensity) = c.representative_peaks();
                let mz = mz.to_vec();
                let intensity = intensity.to_vec();
                let best_ids = c.best_match_id_index().clone();
                (mz, intensity, best_ids)
            };
            let view = ClusterView {
                id: self.active[idx].id(),
                mz: &candidate_view.0,
                intensity: &candidate_view.1,
                best_match_ids: &candidate_view.2,
            };
            if !self.cluster_predicate.accept(&view, &spectrum_view) {
                continue;
            }

            let universe = union_bin_count(&candidate_view.0, spectrum.mz());
            let sigma = self.scorer.score(
                &candidate_view.0,
                &candidate_view.1,
                spectrum.mz(),
                spectrum.intensity(),
                universe,
            ) as f32;

            self.active[idx].save_comparison_result(spectrum.uui().to_string(), sigma);
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
                let id = self.active[idx].id().to_string();
                self.reposition(idx, |c| {
                    c.add_spectra(std::slice::from_ref(&spectrum));
                });
                id
            }
            None => {
                let mut cluster = Cluster::new(new_uui(), self.config.noise_filter_increment);
                cluster.add_spectra(std::slice::from_ref(&spectrum));
                let id = cluster.id().to_string();
                self.insert_sorted(cluster);
                id
            }
        }
    }
}
