//! Benchmarks the greedy clustering engine's insert path (§4.5):
//! feeding a stream of synthetic spectra, a mix of near-duplicates (to
//! exercise `addSpectra`/merge) and far-apart precursors (to exercise
//! eviction), through `process_spectrum`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use spectra_cluster::engine::{CancelToken, EngineConfig, GreedyClusteringEngine};
use spectra_cluster::predicate::ShareHighestPeaksClusterPredicate;
use spectra_cluster::similarity::CombinedFisherIntensityTest;
use spectra_cluster::spectrum::BinarySpectrum;

fn make_engine() -> GreedyClusteringEngine<CombinedFisherIntensityTest> {
    GreedyClusteringEngine::new(
        EngineConfig {
            precursor_tolerance_bins: 10,
            min_comparisons: 10,
            noise_filter_increment: 100,
        },
        CombinedFisherIntensityTest::default(),
        Box::new(ShareHighestPeaksClusterPredicate::default()),
        None,
        CancelToken::new(),
    )
}

/// `groups` clusters of `per_group` near-identical spectra each, spaced
/// far enough apart in precursor bin to force eviction between groups.
fn synthetic_stream(groups: usize, per_group: usize) -> Vec<BinarySpectrum> {
    let mut spectra = Vec::with_capacity(groups * per_group);
    for g in 0..groups {
        let bin = (g as i32) * 10_000;
        let mz: Vec<i32> = (0..40).map(|i| i * 3).collect();
        for s in 0..per_group {
            let intensity: Vec<i32> = (0..40).map(|i| 1000 - i + (s as i32 % 3)).collect();
            spectra.push(BinarySpectrum::new(
                format!("g{g}s{s}"),
                bin,
                2,
                mz.clone(),
                intensity,
            ));
        }
    }
    spectra
}

fn bench_insert_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_insert_path");
    for &per_group in &[1usize, 5, 20] {
        let stream = synthetic_stream(20, per_group);
        group.bench_with_input(BenchmarkId::from_parameter(per_group), &per_group, |b, _| {
            b.iter(|| {
                let mut engine = make_engine();
                for spectrum in stream.clone() {
                    black_box(engine.process_spectrum(spectrum));
                }
                engine.finish();
                black_box(engine.emitted().len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert_path);
criterion_main!(benches);
