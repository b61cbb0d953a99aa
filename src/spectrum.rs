//! The raw peak type and the immutable, integerized [`BinarySpectrum`].

/// A single raw fragment peak before binarization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Mass-to-charge ratio.
    pub mz: f64,
    /// Signal intensity.
    pub intensity: f64,
}

impl Peak {
    /// Build a peak from its two components.
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self { mz, intensity }
    }
}

/// Mint a fresh, stable 128-bit identifier rendered as fixed-width
/// lowercase hex (Design Note 9), used for both spectrum `uui`s and
/// cluster ids.
pub fn new_uui() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// An integerized spectrum: binned m/z and intensity, plus precursor
/// metadata. Immutable once built — all mutation happens on the consensus
/// state that eventually derives a `BinarySpectrum` of its own.
#[derive(Debug, Clone)]
pub struct BinarySpectrum {
    uui: String,
    precursor_mz_bin: i32,
    precursor_charge: i32,
    mz: Vec<i32>,
    intensity: Vec<i32>,
}

impl BinarySpectrum {
    /// Build a spectrum from already-binned, already-filtered, mz-sorted
    /// parallel arrays. Panics if the arrays are mismatched in length —
    /// that would violate the type's core invariant and indicates a bug in
    /// the caller, not a recoverable input error.
    pub fn new(
        uui: String,
        precursor_mz_bin: i32,
        precursor_charge: i32,
        mz: Vec<i32>,
        intensity: Vec<i32>,
    ) -> Self {
        assert_eq!(mz.len(), intensity.len(), "mz/intensity length mismatch");
        Self {
            uui,
            precursor_mz_bin,
            precursor_charge,
            mz,
            intensity,
        }
    }

    /// The spectrum's stable identifier.
    pub fn uui(&self) -> &str {
        &self.uui
    }

    /// Precursor m/z, binned with [`crate::binning::precursor::precursor_mz_bin`].
    pub fn precursor_mz_bin(&self) -> i32 {
        self.precursor_mz_bin
    }

    /// Precursor charge; 0 means unknown (wildcard).
    pub fn precursor_charge(&self) -> i32 {
        self.precursor_charge
    }

    /// Sorted ascending, strictly increasing after per-bin filtering.
    pub fn mz(&self) -> &[i32] {
        &self.mz
    }

    /// Parallel to [`BinarySpectrum::mz`].
    pub fn intensity(&self) -> &[i32] {
        &self.intensity
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Whether the spectrum carries no peaks at all.
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uui_is_32_lowercase_hex_chars() {
        let id = new_uui();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn two_uuis_differ() {
        assert_ne!(new_uui(), new_uui());
    }

    #[test]
    #[should_panic]
    fn mismatched_arrays_panic() {
        BinarySpectrum::new("x".into(), 0, 1, vec![1, 2], vec![1]);
    }
}
