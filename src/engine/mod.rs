//! The greedy, single-pass clustering state machine (§4.5).
//!
//! `active` is kept sorted ascending by `precursor_mz_bin` at all times;
//! eviction, insertion and repositioning all preserve that invariant so
//! the emitted stream is non-decreasing in precursor bin (§8 invariant
//! 1) without needing a separate heap or tree structure.
//!
//! The engine does not trust the order spectra arrive in (§4.5, §6):
//! [`spectrum_mode`]'s `process_spectrum` only buffers its input, and
//! `finish` sorts the buffer ascending by precursor bin, stable on
//! ties, before replaying it through the same insert/evict machinery a
//! pre-sorted stream would have driven directly.

mod merge_mode;
mod spectrum_mode;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::assessor::MinNumberComparisonsAssessor;
use crate::cluster::Cluster;
use crate::predicate::ClusterPredicate;
use crate::similarity::SimilarityScorer;
use crate::spectrum::BinarySpectrum;

/// A cooperative cancellation flag, polled between inputs. Cloning
/// shares the same underlying flag, so a signal handler can hold one
/// end while the engine polls the other.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tunables for [`GreedyClusteringEngine`], mirroring the configuration
/// keys in §6 that govern the clustering pass itself (binning and I/O
/// configuration lives in [`crate::config`]).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `Δ_p`: precursor tolerance in m/z bins.
    pub precursor_tolerance_bins: i32,
    /// Floor for the comparisons-assessor threshold table.
    pub min_comparisons: u32,
    /// Consensus noise-filter window, forwarded to every new cluster.
    pub noise_filter_increment: i32,
}

/// Exact charge match required unless either side is the wildcard `0`.
pub fn charge_compatible(a: i32, b: i32) -> bool {
    a == 0 || b == 0 || a == b
}

/// The streaming clustering engine. Not thread-safe and not `Send`
/// across the spectrum-at-a-time boundary: callers run it on a single
/// thread, optionally fed by a separate preparation pipeline
/// ([`crate::pipeline`]).
pub struct GreedyClusteringEngine<S: SimilarityScorer> {
    active: Vec<Cluster>,
    emitted: Vec<Cluster>,
    /// Spectra handed to `process_spectrum`, not yet sorted/replayed.
    pending: Vec<BinarySpectrum>,
    config: EngineConfig,
    scorer: S,
    assessor: MinNumberComparisonsAssessor,
    cluster_predicate: Box<dyn ClusterPredicate>,
    comparison_filter_predicate: Option<Box<dyn ClusterPredicate>>,
    cancel: CancelToken,
}

impl<S: SimilarityScorer> GreedyClusteringEngine<S> {
    pub fn new(
        config: EngineConfig,
        scorer: S,
        cluster_predicate: Box<dyn ClusterPredicate>,
        comparison_filter_predicate: Option<Box<dyn ClusterPredicate>>,
        cancel: CancelToken,
    ) -> Self {
        let assessor = MinNumberComparisonsAssessor::new(config.min_comparisons);
        Self {
            active: Vec::new(),
            emitted: Vec::new(),
            pending: Vec::new(),
            config,
            scorer,
            assessor,
            cluster_predicate,
            comparison_filter_predicate,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Clusters flushed so far, in emission order. Draining is left to
    /// the caller (a `std::mem::take` keeps the engine usable).
    pub fn emitted(&mut self) -> &mut Vec<Cluster> {
        &mut self.emitted
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Move every cluster whose precursor bin is strictly below
    /// `boundary` from `active` to `emitted`, in ascending order.
    /// Eviction is total: nothing evicted is ever reconsidered.
    fn evict_below(&mut self, boundary: i32) {
        let split = self.active.partition_point(|c| c.precursor_mz_bin() < boundary);
        self.emitted.extend(self.active.drain(0..split));
    }

    /// Insert keeping `active` sorted ascending by precursor bin. Ties
    /// are broken by insertion order: a new cluster lands after any
    /// existing cluster with an equal bin, so relative creation order
    /// among equal-bin clusters is preserved ("stable", §4.5 step 7).
    fn insert_sorted(&mut self, cluster: Cluster) {
        let bin = cluster.precursor_mz_bin();
        let pos = self.active.partition_point(|c| c.precursor_mz_bin() <= bin);
        self.active.insert(pos, cluster);
    }

    /// Remove the cluster at `idx`, mutate it via `f`, and reinsert at
    /// its new sorted position. Used after `add_spectra`/`merge`, which
    /// can shift a cluster's average precursor bin.
    fn reposition(&mut self, idx: usize, f: impl FnOnce(&mut Cluster)) {
        let mut cluster = self.active.remove(idx);
        f(&mut cluster);
        self.insert_sorted(cluster);
    }

    /// The index range of `active` whose precursor bin falls within
    /// `Δ_p` of `bin` (a superset of the charge-compatible candidates;
    /// callers additionally filter by charge).
    fn window_range(&self, bin: i32) -> std::ops::Range<usize> {
        let lo = bin - self.config.precursor_tolerance_bins;
        let hi = bin + self.config.precursor_tolerance_bins;
        let start = self.active.partition_point(|c| c.precursor_mz_bin() < lo);
        let end = self.active.partition_point(|c| c.precursor_mz_bin() <= hi);
        start..end
    }

    /// Poll the cancellation token between inputs; if set, flush
    /// everything remaining in ascending precursor-bin order and report
    /// that the caller should stop feeding new input.
    fn poll_cancel(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.emitted.append(&mut self.active);
            true
        } else {
            false
        }
    }

    /// Flush all remaining active clusters in ascending precursor-bin
    /// order. Call once the input stream is exhausted.
    pub fn finish(&mut self) {
        self.drain_pending();
        self.emitted.append(&mut self.active);
    }

    /// Sort buffered spectra ascending by precursor bin (stable, so
    /// spectra with equal bins keep their arrival order) and replay
    /// them through [`spectrum_mode::insert_sorted_spectrum`], exactly
    /// as if they had arrived from the reader in that order. This is
    /// what makes `process_spectrum` immune to file order (§4.5, §6).
    fn drain_pending(&mut self) {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|s| s.precursor_mz_bin());
        for spectrum in pending {
            if self.poll_cancel() {
                break;
            }
            self.insert_sorted_spectrum(spectrum);
        }
    }
}

/// Tie-break key for "highest similarity wins" candidate selection
/// (§4.5 step 6): highest similarity, then highest member count, then
/// lowest precursor bin, then lowest id.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CandidateKey<'a> {
    similarity: f32,
    member_count: usize,
    precursor_mz_bin: i32,
    id: &'a str,
}

impl<'a> CandidateKey<'a> {
    fn is_better_than(&self, other: &CandidateKey<'a>) -> bool {
        if self.similarity != other.similarity {
            return self.similarity > other.similarity;
        }
        if self.member_count != other.member_count {
            return self.member_count > other.member_count;
        }
        if self.precursor_mz_bin != other.precursor_mz_bin {
            return self.precursor_mz_bin < other.precursor_mz_bin;
        }
        self.id < other.id
    }
}

/// Size of the union of two sorted, deduplicated bin arrays: the
/// "bin universe" the Fisher-exact scorer treats as its population
/// (§4.3's `binUniverse`). Resolves the spec's silence on the exact
/// universe definition by taking the observed union of the two sides
/// being compared, rather than a corpus-wide bin range.
pub(super) fn union_bin_count(a_mz: &[i32], b_mz: &[i32]) -> u32 {
    let mut i = 0;
    let mut j = 0;
    let mut count = 0u32;
    while i < a_mz.len() && j < b_mz.len() {
        match a_mz[i].cmp(&b_mz[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
        count += 1;
    }
    count += (a_mz.len() - i) as u32;
    count += (b_mz.len() - j) as u32;
    count
}

/// Pick the best-scoring candidate index from `scored` (index into
/// `active`, similarity), applying the §4.5 step 6 tie-break.
fn pick_best(active: &[Cluster], scored: &[(usize, f32)]) -> Option<usize> {
    let mut best: Option<(usize, CandidateKey)> = None;
    for &(idx, sigma) in scored {
        let cluster = &active[idx];
        let key = CandidateKey {
            similarity: sigma,
            member_count: cluster.member_count(),
            precursor_mz_bin: cluster.precursor_mz_bin(),
            id: cluster.id(),
        };
        match &best {
            Some((_, best_key)) if !key.is_better_than(best_key) => {}
            _ => best = Some((idx, key)),
        }
    }
    best.map(|(idx, _)| idx)
}
