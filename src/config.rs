//! TOML configuration for the clustering pipeline (§6 "Configuration").
//!
//! Instead of passing every knob as a CLI flag, a run can load a config
//! file:
//!
//! ```toml
//! [clustering]
//! precursor_tolerance_bins = 10
//! min_comparisons = 100
//! n_highest_peaks_raw = 40
//! noise_filter_increment = 100
//! top_peak_share_k = 5
//! cluster_store_mode = "dynamic"
//! expected_cluster_count = 100000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::engine::EngineConfig;

/// Which [`crate::store::ClusterStorage`] backend a run should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStoreMode {
    /// Pre-sized, memory-mapped store; requires `expected_cluster_count`.
    Static,
    /// Block-structured, Snappy-compressed store; no pre-sizing.
    Dynamic,
}

impl Default for ClusterStoreMode {
    fn default() -> Self {
        Self::Dynamic
    }
}

/// Root configuration structure for a clustering run's config file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Clustering-specific settings.
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

/// Every configuration key recognized by the core (§6).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// `Δ_p`: precursor tolerance in m/z bins. Takes precedence over
    /// `precursor_tolerance_ppm` when both are set, since the engine's
    /// window comparisons operate in bins.
    pub precursor_tolerance_bins: i32,

    /// Precursor tolerance expressed in ppm instead of bins; converted
    /// to bins at a nominal 500 m/z when `precursor_tolerance_bins` is
    /// left at its default.
    pub precursor_tolerance_ppm: Option<f64>,

    /// Fragment tolerance, in fragment m/z bins, used as the per-bin
    /// filter's window and the scorer's peak-match tolerance.
    pub fragment_tolerance: i32,

    /// Floor for the comparisons-assessor threshold table.
    pub min_comparisons: u32,

    /// Retain this many of the most intense raw peaks before binning.
    pub n_highest_peaks_raw: usize,

    /// Consensus noise-filter window width, in fragment m/z bins.
    pub noise_filter_increment: i32,

    /// `k` for [`crate::predicate::ShareHighestPeaksClusterPredicate`].
    pub top_peak_share_k: usize,

    /// Which cluster-store backend to use.
    pub cluster_store_mode: ClusterStoreMode,

    /// Required when `cluster_store_mode = "static"`.
    pub expected_cluster_count: Option<usize>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            precursor_tolerance_bins: 10,
            precursor_tolerance_ppm: None,
            fragment_tolerance: 1,
            min_comparisons: 100,
            n_highest_peaks_raw: 40,
            noise_filter_increment: crate::consensus::DEFAULT_NOISE_FILTER_INCREMENT,
            top_peak_share_k: 5,
            cluster_store_mode: ClusterStoreMode::Dynamic,
            expected_cluster_count: None,
        }
    }
}

impl ClusteringConfig {
    /// Resolve this config into the engine's narrower tunable set.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            precursor_tolerance_bins: self.precursor_tolerance_bins,
            min_comparisons: self.min_comparisons,
            noise_filter_increment: self.noise_filter_increment,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse TOML configuration")
    }
}
