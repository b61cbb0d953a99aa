//! # spectra-cluster-rs
//!
//! Streaming greedy clustering of tandem mass spectra (MS/MS) into
//! consensus spectra, for redundancy reduction ahead of peptide
//! identification.
//!
//! ## Pipeline
//!
//! ```text
//! reader -> raw-peak filters -> binarization -> per-bin filter
//!        -> GreedyClusteringEngine -> consensus spectra -> stores
//! ```
//!
//! - [`reader`]: the external peak-list reader contract plus a
//!   reference MGF adapter.
//! - [`filters`]: raw-peak filter chain applied before binarization.
//! - [`binning`]: m/z binning, intensity normalization, precursor
//!   binning, the per-bin highest-peak filter.
//! - [`spectrum`]: [`spectrum::BinarySpectrum`], the immutable
//!   integerized spectrum.
//! - [`consensus`]: the incremental consensus-spectrum builder.
//! - [`cluster`]: [`cluster::Cluster`] and its bounded best-matches
//!   history.
//! - [`similarity`]: the combined Fisher/Kendall similarity scorer.
//! - [`assessor`]: the number-of-comparisons threshold assessor.
//! - [`predicate`]: cheap pre-filters evaluated before scoring.
//! - [`engine`]: the greedy clustering state machine (spectrum and
//!   merge modes).
//! - [`pipeline`]: the bounded worker-pool plumbing that can front the
//!   engine.
//! - [`store`]: cluster and property persistence, in-memory and on-disk.
//! - [`msp`]: MSP spectral-library block emission.
//! - [`config`]: TOML-driven run configuration.

pub mod assessor;
pub mod binning;
pub mod cluster;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod error;
pub mod filters;
pub mod msp;
pub mod pipeline;
pub mod predicate;
pub mod reader;
pub mod similarity;
pub mod spectrum;
pub mod store;

/// Re-export of the commonly used types, for `use spectra_cluster::prelude::*;`.
pub mod prelude {
    pub use crate::assessor::MinNumberComparisonsAssessor;
    pub use crate::binning::{
        BasicIntegerNormalizer, CumulativeIntensityNormalizer, HighestPeakPerBinFunction,
        IntensityNormalizer, LogNormalizer, MaxPeakNormalizer, MzBinner, SequestBinner, TideBinner,
    };
    pub use crate::cluster::{BestMatches, Cluster, ComparisonMatch};
    pub use crate::config::{ClusterStoreMode, ClusteringConfig, Config};
    pub use crate::consensus::ConsensusSpectrumState;
    pub use crate::engine::{CancelToken, EngineConfig, GreedyClusteringEngine};
    pub use crate::error::ClusterError;
    pub use crate::filters::{
        FilterChain, KeepNHighestRawPeaks, RemoveImpossiblyHighPeaks, RemovePrecursorPeaks,
        SpectrumFilter,
    };
    pub use crate::predicate::{
        ClusterIsKnownComparisonPredicate, ClusterPredicate, ClusterView,
        ShareHighestPeaksClusterPredicate,
    };
    pub use crate::reader::{MgfReader, RawSpectrumRecord, SpectrumSource};
    pub use crate::similarity::{CombinedFisherIntensityTest, SimilarityScorer};
    pub use crate::spectrum::{new_uui, BinarySpectrum, Peak};
    pub use crate::store::{ClusterStorage, PropertyStorage};
}
