//! `spectra-cluster cluster` — run the full pipeline over one or more
//! MGF files and write the resulting clusters to a cluster store.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use log::{error, info, warn};

use super::ExitStatus;
use crate::binning::{HighestPeakPerBinFunction, SequestBinner};
use crate::binning::intensity::BasicIntegerNormalizer;
use crate::cluster::Cluster;
use crate::config::{ClusterStoreMode, Config};
use crate::engine::{CancelToken, GreedyClusteringEngine};
use crate::error::ClusterError;
use crate::filters::{FilterChain, KeepNHighestRawPeaks, RemoveImpossiblyHighPeaks, RemovePrecursorPeaks};
use crate::pipeline::prepare_spectrum;
use crate::predicate::ShareHighestPeaksClusterPredicate;
use crate::reader::{MgfReader, SpectrumSource};
use crate::similarity::CombinedFisherIntensityTest;
use crate::store::{ClusterStorage, DynamicClusterStore, StaticClusterStore};

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(&path),
        None => Ok(Config::default()),
    }
}

fn is_supported_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mgf"))
        .unwrap_or(false)
}

/// Feed every record of one MGF file through the prepare step and into
/// the engine. Records are handed to the engine in file (scan) order;
/// the engine itself buffers and sorts by precursor bin before
/// inserting anything, so callers don't need to pre-sort across files
/// or within one. A file that fails to open or sniff as MGF is fatal
/// only for itself (§7): the caller moves on to the next input.
fn process_file(
    path: &std::path::Path,
    filters: &FilterChain,
    binner: &SequestBinner,
    normalizer: &BasicIntegerNormalizer,
    per_bin_filter: &HighestPeakPerBinFunction,
    engine: &mut GreedyClusteringEngine<CombinedFisherIntensityTest>,
) -> Result<usize, ClusterError> {
    let file = File::open(path)?;
    let mut reader = MgfReader::new(BufReader::new(file))?;

    let mut processed = 0usize;
    while let Some(record) = reader.next_record()? {
        if let Some(spectrum) = prepare_spectrum(record, filters, binner, normalizer, per_bin_filter) {
            engine.process_spectrum(spectrum);
            processed += 1;
        }
    }
    Ok(processed)
}

fn write_clusters(
    clusters: &[Cluster],
    output: &std::path::Path,
    mode: ClusterStoreMode,
    expected_cluster_count: Option<usize>,
    noise_filter_increment: i32,
) -> Result<(), ClusterError> {
    match mode {
        ClusterStoreMode::Dynamic => {
            let mut store = DynamicClusterStore::open(output, noise_filter_increment)?;
            for cluster in clusters {
                store.put(cluster.id(), cluster)?;
            }
            store.close()
        }
        ClusterStoreMode::Static => {
            let expected = expected_cluster_count.unwrap_or_else(|| clusters.len().max(1));
            let mut store = StaticClusterStore::create(output, expected, 1 << 16, noise_filter_increment)?;
            for cluster in clusters {
                store.put(cluster.id(), cluster)?;
            }
            store.close()
        }
    }
}

pub fn run(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config_path: Option<PathBuf>,
    store_mode: ClusterStoreMode,
    expected_cluster_count: Option<usize>,
) -> ExitStatus {
    let config = match load_config(config_path) {
        Ok(c) => c.clustering,
        Err(err) => {
            error!("failed to load configuration: {err}");
            return ExitStatus::InvalidInput;
        }
    };

    let filters = FilterChain::new()
        .push(RemoveImpossiblyHighPeaks::default())
        .push(RemovePrecursorPeaks {
            window_da: config.fragment_tolerance as f64,
        })
        .push(KeepNHighestRawPeaks {
            n: config.n_highest_peaks_raw,
        });
    let binner = SequestBinner::default();
    let normalizer = BasicIntegerNormalizer { scale: 1.0 };
    let per_bin_filter = HighestPeakPerBinFunction::new(config.fragment_tolerance);

    let mut engine = GreedyClusteringEngine::new(
        config.engine_config(),
        CombinedFisherIntensityTest {
            peak_match_tolerance: 0,
        },
        Box::new(ShareHighestPeaksClusterPredicate {
            k: config.top_peak_share_k,
        }),
        None,
        CancelToken::new(),
    );

    let mut worst: Option<ExitStatus> = None;
    let mut any_succeeded = false;

    for input in &inputs {
        if !is_supported_extension(input) {
            error!("unsupported file type: {}", input.display());
            worst = worst.or(Some(ExitStatus::UnsupportedFileType));
            continue;
        }
        match process_file(input, &filters, &binner, &normalizer, &per_bin_filter, &mut engine) {
            Ok(n) => {
                info!("processed {n} spectra from {}", input.display());
                any_succeeded = true;
            }
            Err(ClusterError::InputFormat(msg)) => {
                error!("input format error in {}: {msg}", input.display());
                worst = worst.or(Some(ExitStatus::InvalidInput));
            }
            Err(err) => {
                error!("I/O error reading {}: {err}", input.display());
                worst = worst.or(Some(ExitStatus::IoFailure));
            }
        }
    }

    engine.finish();
    let clusters = std::mem::take(engine.emitted());
    info!("emitted {} clusters", clusters.len());

    if let Err(err) = write_clusters(
        &clusters,
        &output,
        store_mode,
        expected_cluster_count,
        config.noise_filter_increment,
    ) {
        error!("failed to write cluster store {}: {err}", output.display());
        return ExitStatus::IoFailure;
    }

    if let Some(status) = worst {
        if any_succeeded {
            warn!("completed with partial failures across {} input(s)", inputs.len());
        }
        return status;
    }
    ExitStatus::Success
}
