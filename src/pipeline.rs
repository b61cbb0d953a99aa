//! The bounded worker-pool -> size-bounded FIFO that can front the
//! engine (§5): spectrum preparation (load -> raw filter -> binarize ->
//! per-bin filter) optionally runs off the engine's thread, producing
//! into a bounded channel the engine drains one spectrum at a time.
//!
//! Modeled directly on a background-thread/bounded-channel writer
//! pattern: a dedicated thread owns the reader and blocks on a bounded
//! `crossbeam-channel` sender, applying natural backpressure so a slow
//! engine does not let an unbounded backlog of prepared spectra pile up
//! in memory.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, warn};

use crate::binning::{HighestPeakPerBinFunction, IntensityNormalizer, MzBinner};
use crate::binning::precursor::precursor_mz_bin;
use crate::error::ClusterError;
use crate::filters::FilterChain;
use crate::reader::{RawSpectrumRecord, SpectrumSource};
use crate::spectrum::{new_uui, BinarySpectrum};

/// Default bound on the number of prepared spectra held in flight
/// between the preparation thread and the engine.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Turns one raw record into a binarized, per-bin-filtered
/// [`BinarySpectrum`], or `None` if it was dropped (empty after
/// filtering — an `EmptySpectrumWarning`, logged and absorbed locally
/// per §7's policy).
pub fn prepare_spectrum(
    record: RawSpectrumRecord,
    filters: &FilterChain,
    binner: &dyn MzBinner,
    normalizer: &dyn IntensityNormalizer,
    per_bin_filter: &HighestPeakPerBinFunction,
) -> Option<BinarySpectrum> {
    let filtered = filters.apply(record.precursor_mz, record.precursor_charge, record.peaks);
    if filtered.is_empty() {
        warn!("spectrum '{}' has no peaks after filtering, dropping", record.title);
        return None;
    }

    let mz: Vec<i32> = filtered.iter().map(|p| binner.bin(p.mz)).collect();
    let raw_intensity: Vec<f64> = filtered.iter().map(|p| p.intensity).collect();
    let intensity = normalizer.normalize(&raw_intensity);

    let (mz, intensity) = per_bin_filter.apply(&mz, &intensity);
    if mz.is_empty() {
        warn!("spectrum '{}' has no peaks after per-bin filtering, dropping", record.title);
        return None;
    }

    Some(BinarySpectrum::new(
        new_uui(),
        precursor_mz_bin(record.precursor_mz),
        record.precursor_charge,
        mz,
        intensity,
    ))
}

/// Shared, cloneable configuration for [`prepare_spectrum`], boxed
/// behind trait objects so the background thread can own one without
/// generic parameters leaking into [`PreparationPipeline`]'s type.
pub struct PreparationConfig {
    pub filters: FilterChain,
    pub binner: Box<dyn MzBinner>,
    pub normalizer: Box<dyn IntensityNormalizer>,
    pub per_bin_filter: HighestPeakPerBinFunction,
}

/// Runs spectrum preparation on a background thread, feeding a bounded
/// channel the engine drains. Dropping the pipeline joins the worker
/// thread.
pub struct PreparationPipeline {
    receiver: Receiver<Result<BinarySpectrum, ClusterError>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl PreparationPipeline {
    /// Spawn the background worker. `source` is consumed entirely by
    /// the worker thread.
    pub fn spawn(
        mut source: Box<dyn SpectrumSource + Send>,
        config: PreparationConfig,
        capacity: usize,
    ) -> Self {
        let (tx, rx): (Sender<Result<BinarySpectrum, ClusterError>>, _) = bounded(capacity);
        let handle = std::thread::spawn(move || loop {
            let next = match source.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => {
                    error!("reader error, aborting preparation thread: {err}");
                    let _ = tx.send(Err(err));
                    break;
                }
            };
            if let Some(spectrum) = prepare_spectrum(
                next,
                &config.filters,
                config.binner.as_ref(),
                config.normalizer.as_ref(),
                &config.per_bin_filter,
            ) {
                if tx.send(Ok(spectrum)).is_err() {
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            handle: Some(handle),
        }
    }

    /// Block for the next prepared spectrum, or `None` once the source
    /// is exhausted and the worker thread has shut down.
    pub fn recv(&mut self) -> Option<Result<BinarySpectrum, ClusterError>> {
        self.receiver.recv().ok()
    }
}

impl Drop for PreparationPipeline {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(feature = "parallel-prepare")]
/// Prepare a batch of records in parallel via rayon, preserving input
/// order in the output. The engine buffers and re-sorts by precursor
/// bin itself before inserting anything (`GreedyClusteringEngine::finish`),
/// so this ordering isn't load-bearing for clustering correctness — it
/// only keeps a stable index-to-record mapping around for debugging.
pub fn prepare_batch_parallel(
    records: Vec<RawSpectrumRecord>,
    config: &PreparationConfig,
) -> Vec<Option<BinarySpectrum>> {
    use rayon::prelude::*;
    records
        .into_par_iter()
        .map(|record| {
            prepare_spectrum(
                record,
                &config.filters,
                config.binner.as_ref(),
                config.normalizer.as_ref(),
                &config.per_bin_filter,
            )
        })
        .collect()
}
