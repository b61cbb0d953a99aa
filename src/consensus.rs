//! The incremental consensus spectrum: a sparse summed-peak map from which
//! a representative, noise-filtered spectrum is lazily derived.
//!
//! `add`/`merge` only ever grow the sparse map — nothing is removed until
//! read time, which keeps both operations associative and commutative
//! (§8 invariant 9) and cheap regardless of how often they are called.

use std::collections::BTreeMap;

use crate::spectrum::BinarySpectrum;

/// Default width, in fragment m/z bins, of a noise-filter window.
pub const DEFAULT_NOISE_FILTER_INCREMENT: i32 = 100;

/// Sparse, incrementally-built summary of a cluster's member spectra.
#[derive(Debug, Clone)]
pub struct ConsensusSpectrumState {
    uui: String,
    n_spectra: i64,
    sum_precursor_mz: i64,
    sum_precursor_charge: i64,
    /// mz_bin -> (summed intensity, member count at that bin).
    peak_map: BTreeMap<i32, (i64, i32)>,
    noise_filter_increment: i32,
    dirty: bool,
    representative_cache: Option<(Vec<i32>, Vec<i32>)>,
}

impl ConsensusSpectrumState {
    /// A fresh, empty consensus state carrying its own stable identifier.
    pub fn new(uui: String, noise_filter_increment: i32) -> Self {
        Self {
            uui,
            n_spectra: 0,
            sum_precursor_mz: 0,
            sum_precursor_charge: 0,
            peak_map: BTreeMap::new(),
            noise_filter_increment: noise_filter_increment.max(1),
            dirty: false,
            representative_cache: None,
        }
    }

    /// Reconstruct a state from its serialized parts (see `store::codec`).
    /// `noise_filter_increment` is a runtime/pipeline parameter, not part
    /// of the wire format, so it is supplied fresh on every load.
    pub fn from_parts(
        uui: String,
        n_spectra: i64,
        sum_precursor_mz: i64,
        sum_precursor_charge: i64,
        peak_map: BTreeMap<i32, (i64, i32)>,
        noise_filter_increment: i32,
    ) -> Self {
        Self {
            uui,
            n_spectra,
            sum_precursor_mz,
            sum_precursor_charge,
            peak_map,
            noise_filter_increment: noise_filter_increment.max(1),
            dirty: true,
            representative_cache: None,
        }
    }

    pub fn uui(&self) -> &str {
        &self.uui
    }

    pub fn set_uui(&mut self, uui: String) {
        self.uui = uui;
    }

    pub fn n_spectra(&self) -> i64 {
        self.n_spectra
    }

    pub fn sum_precursor_mz(&self) -> i64 {
        self.sum_precursor_mz
    }

    pub fn sum_precursor_charge(&self) -> i64 {
        self.sum_precursor_charge
    }

    /// Cheap precursor m/z bin estimate (average), independent of the
    /// noise-filtered representative. Used by the engine to keep `active`
    /// sorted without paying for a full representative recompute on every
    /// insert.
    pub fn precursor_mz_bin(&self) -> i32 {
        if self.n_spectra == 0 {
            0
        } else {
            (self.sum_precursor_mz as f64 / self.n_spectra as f64).round() as i32
        }
    }

    /// Mode would require tracking every member's charge; we track only
    /// the running sum, so this is the averaged integer charge (rounded).
    pub fn precursor_charge(&self) -> i32 {
        if self.n_spectra == 0 {
            0
        } else {
            (self.sum_precursor_charge as f64 / self.n_spectra as f64).round() as i32
        }
    }

    /// Fold a member spectrum's peaks and precursor metadata into the
    /// running sums. O(peaks).
    pub fn add(&mut self, spectrum: &BinarySpectrum) {
        for (&mz_bin, &intensity) in spectrum.mz().iter().zip(spectrum.intensity().iter()) {
            let entry = self.peak_map.entry(mz_bin).or_insert((0, 0));
            entry.0 += intensity as i64;
            entry.1 += 1;
        }
        self.sum_precursor_mz += spectrum.precursor_mz_bin() as i64;
        self.sum_precursor_charge += spectrum.precursor_charge() as i64;
        self.n_spectra += 1;
        self.invalidate();
    }

    /// Pointwise sum of two consensus states. O(other.peaks).
    pub fn merge(&mut self, other: &ConsensusSpectrumState) {
        for (&mz_bin, &(sum, count)) in other.peak_map.iter() {
            let entry = self.peak_map.entry(mz_bin).or_insert((0, 0));
            entry.0 += sum;
            entry.1 += count;
        }
        self.sum_precursor_mz += other.sum_precursor_mz;
        self.sum_precursor_charge += other.sum_precursor_charge;
        self.n_spectra += other.n_spectra;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.representative_cache = None;
    }

    /// The sparse bins in sorted order, for serialization.
    pub fn sorted_bins(&self) -> Vec<(i32, i64, i32)> {
        self.peak_map
            .iter()
            .map(|(&bin, &(sum, count))| (bin, sum, count))
            .collect()
    }

    /// Lazily recompute and return the noise-filtered representative
    /// spectrum: within each window of `noise_filter_increment` bins, keep
    /// the top `ceil(5 * log2(nSpectra + 1))` peaks by summed intensity.
    /// Dropped bins are pruned only from the returned representative; the
    /// underlying sparse map keeps them, so repeated reads after further
    /// `add`/`merge` calls are cheap to recompute from full history.
    pub fn representative(&mut self) -> (&[i32], &[i32]) {
        if self.dirty || self.representative_cache.is_none() {
            self.representative_cache = Some(self.compute_representative());
            self.dirty = false;
        }
        let (mz, intensity) = self.representative_cache.as_ref().expect("just computed");
        (mz.as_slice(), intensity.as_slice())
    }

    fn compute_representative(&self) -> (Vec<i32>, Vec<i32>) {
        let keep = ((5.0 * ((self.n_spectra + 1) as f64).log2()).ceil().max(1.0)) as usize;
        let mut out_mz = Vec::new();
        let mut out_intensity = Vec::new();

        let mut iter = self.peak_map.iter().peekable();
        while let Some((&first_bin, _)) = iter.peek().copied() {
            let window = first_bin.div_euclid(self.noise_filter_increment);
            let mut group: Vec<(i32, i64)> = Vec::new();
            while let Some((&bin, &(sum, _count))) = iter.peek().copied() {
                if bin.div_euclid(self.noise_filter_increment) != window {
                    break;
                }
                group.push((bin, sum));
                iter.next();
            }
            group.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            group.truncate(keep);
            group.sort_by_key(|&(bin, _)| bin);
            for (bin, sum) in group {
                out_mz.push(bin);
                out_intensity.push(sum.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
            }
        }
        (out_mz, out_intensity)
    }

    /// Derive a [`BinarySpectrum`] from the current representative, with
    /// `uui` stable across the cluster's lifetime.
    pub fn get_consensus_spectrum(&mut self) -> BinarySpectrum {
        let uui = self.uui.clone();
        let precursor_mz_bin = self.precursor_mz_bin();
        let precursor_charge = self.precursor_charge();
        let (mz, intensity) = self.representative();
        BinarySpectrum::new(uui, precursor_mz_bin, precursor_charge, mz.to_vec(), intensity.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(uui: &str, precursor_bin: i32, charge: i32, mz: Vec<i32>, intensity: Vec<i32>) -> BinarySpectrum {
        BinarySpectrum::new(uui.to_string(), precursor_bin, charge, mz, intensity)
    }

    #[test]
    fn add_accumulates_sums_and_counts() {
        let mut state = ConsensusSpectrumState::new("c1".into(), 100);
        state.add(&spectrum("s1", 500250, 2, vec![100, 200], vec![10, 20]));
        state.add(&spectrum("s2", 500250, 2, vec![100, 300], vec![5, 7]));
        assert_eq!(state.n_spectra(), 2);
        let bins = state.sorted_bins();
        assert_eq!(bins, vec![(100, 15, 2), (200, 20, 1), (300, 7, 1)]);
    }

    #[test]
    fn add_and_merge_are_commutative_on_the_representative() {
        let s1 = spectrum("s1", 500250, 2, vec![100, 200], vec![10, 20]);
        let s2 = spectrum("s2", 500250, 2, vec![100, 300], vec![5, 7]);

        let mut direct = ConsensusSpectrumState::new("a".into(), 100);
        direct.add(&s1);
        direct.add(&s2);

        let mut half_a = ConsensusSpectrumState::new("b1".into(), 100);
        half_a.add(&s1);
        let mut half_b = ConsensusSpectrumState::new("b2".into(), 100);
        half_b.add(&s2);
        half_a.merge(&half_b);

        assert_eq!(direct.sorted_bins(), half_a.sorted_bins());
        assert_eq!(direct.n_spectra(), half_a.n_spectra());
        assert_eq!(
            direct.clone().representative(),
            half_a.clone().representative()
        );
    }

    #[test]
    fn representative_applies_noise_filter_per_window() {
        let mut state = ConsensusSpectrumState::new("c".into(), 10);
        // n_spectra will be 1 after a single add -> keep = ceil(5*log2(2)) = 5
        let mz: Vec<i32> = (0..20).collect();
        let intensity: Vec<i32> = (0..20).map(|i| i + 1).collect();
        state.add(&spectrum("s", 0, 1, mz, intensity));
        let (rep_mz, _rep_int) = state.representative();
        // two windows of width 10 (bins 0-9, 10-19), 5 kept each -> 10 peaks
        assert_eq!(rep_mz.len(), 10);
    }

    #[test]
    fn dirty_flag_avoids_recompute_until_mutation() {
        let mut state = ConsensusSpectrumState::new("c".into(), 100);
        state.add(&spectrum("s", 0, 1, vec![1, 2], vec![3, 4]));
        let first = state.representative().0.to_vec();
        let second = state.representative().0.to_vec();
        assert_eq!(first, second);
    }
}
