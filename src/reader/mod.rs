//! The external reader contract (§6 "Reader contract"): the core does
//! not trust file order and re-sorts by precursor bin inside the
//! engine, so a [`SpectrumSource`] only needs to yield records in
//! whatever order its backing format naturally provides them.

pub mod mgf;

pub use mgf::MgfReader;

use std::collections::HashMap;

use crate::error::ClusterError;

/// One raw record as yielded by a reader, before any filtering or
/// binarization.
#[derive(Debug, Clone)]
pub struct RawSpectrumRecord {
    pub title: String,
    pub precursor_mz: f64,
    /// `0` means unknown (wildcard).
    pub precursor_charge: i32,
    /// Sorted ascending by mz.
    pub peaks: Vec<crate::spectrum::Peak>,
    pub additional_params: HashMap<String, String>,
}

/// A peak-list format adapter. Other formats (mzML, mzXML, MS2, APL,
/// PKL, DTA) are out of scope; this trait is the pluggable contract
/// third-party adapters implement, with [`MgfReader`] kept in-tree as
/// the one concrete reference implementation.
pub trait SpectrumSource {
    /// Yield the next record, or `None` at end of input. A malformed
    /// record surfaces `InputFormatError` and is fatal for this source;
    /// other files in a multi-file run are unaffected.
    fn next_record(&mut self) -> Result<Option<RawSpectrumRecord>, ClusterError>;
}
