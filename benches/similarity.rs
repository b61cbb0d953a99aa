//! Benchmarks the combined Fisher/Kendall similarity scorer (§4.3) over
//! spectra sizes representative of a `KeepNHighestRawPeaks` default
//! (40 peaks) run, mirroring the teacher's per-conversion-stage
//! benchmark layout.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spectra_cluster::similarity::{CombinedFisherIntensityTest, SimilarityScorer};

/// A synthetic binarized spectrum with `n` peaks at evenly spaced mz
/// bins, intensities following a simple descending ramp.
fn synthetic_spectrum(n: usize, offset: i32) -> (Vec<i32>, Vec<i32>) {
    let mz: Vec<i32> = (0..n as i32).map(|i| i * 3 + offset).collect();
    let intensity: Vec<i32> = (0..n as i32).map(|i| 1000 - i).collect();
    (mz, intensity)
}

fn bench_identical_spectra(c: &mut Criterion) {
    let scorer = CombinedFisherIntensityTest::default();
    let mut group = c.benchmark_group("combined_fisher_identical");
    for &n in &[10usize, 40, 100, 400] {
        let (mz, intensity) = synthetic_spectrum(n, 0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                scorer.score(
                    black_box(&mz),
                    black_box(&intensity),
                    black_box(&mz),
                    black_box(&intensity),
                    black_box(n as u32 * 10),
                )
            });
        });
    }
    group.finish();
}

fn bench_disjoint_spectra(c: &mut Criterion) {
    let scorer = CombinedFisherIntensityTest::default();
    let mut group = c.benchmark_group("combined_fisher_disjoint");
    for &n in &[10usize, 40, 100, 400] {
        let (a_mz, a_int) = synthetic_spectrum(n, 0);
        let (b_mz, b_int) = synthetic_spectrum(n, 100_000);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                scorer.score(
                    black_box(&a_mz),
                    black_box(&a_int),
                    black_box(&b_mz),
                    black_box(&b_int),
                    black_box(n as u32 * 20),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_identical_spectra, bench_disjoint_spectra);
criterion_main!(benches);
