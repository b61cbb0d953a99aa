//! End-to-end integration tests exercising the full pipeline — reader
//! -> filter chain -> binarization -> per-bin filter -> clustering
//! engine -> cluster store — on small synthetic MGF inputs, covering
//! the §8 scenarios that don't require an external peptide-identified
//! fixture (S1-S4).

use std::io::Cursor;

use spectra_cluster::binning::intensity::BasicIntegerNormalizer;
use spectra_cluster::binning::{HighestPeakPerBinFunction, SequestBinner};
use spectra_cluster::engine::{CancelToken, EngineConfig, GreedyClusteringEngine};
use spectra_cluster::filters::{FilterChain, KeepNHighestRawPeaks, RemoveImpossiblyHighPeaks, RemovePrecursorPeaks};
use spectra_cluster::pipeline::prepare_spectrum;
use spectra_cluster::predicate::ShareHighestPeaksClusterPredicate;
use spectra_cluster::reader::{MgfReader, SpectrumSource};
use spectra_cluster::similarity::CombinedFisherIntensityTest;
use spectra_cluster::store::{ClusterStorage, DynamicClusterStore};

/// Build one MGF block with `n` evenly spaced peaks, PEPMASS
/// `precursor_mz`, charge `charge`.
fn mgf_block(title: &str, precursor_mz: f64, charge: i32, n: usize) -> String {
    let mut block = format!("BEGIN IONS\nTITLE={title}\nPEPMASS={precursor_mz}\nCHARGE={charge}+\n");
    for i in 0..n {
        let mz = 100.0 + i as f64 * 15.0;
        let intensity = 100.0 + i as f64;
        block.push_str(&format!("{mz} {intensity}\n"));
    }
    block.push_str("END IONS\n");
    block
}

fn standard_pipeline() -> (FilterChain, SequestBinner, BasicIntegerNormalizer, HighestPeakPerBinFunction) {
    let filters = FilterChain::new()
        .push(RemoveImpossiblyHighPeaks::default())
        .push(RemovePrecursorPeaks { window_da: 0.5 })
        .push(KeepNHighestRawPeaks { n: 40 });
    let binner = SequestBinner::default();
    let normalizer = BasicIntegerNormalizer { scale: 1.0 };
    let per_bin_filter = HighestPeakPerBinFunction::new(1);
    (filters, binner, normalizer, per_bin_filter)
}

fn standard_engine() -> GreedyClusteringEngine<CombinedFisherIntensityTest> {
    GreedyClusteringEngine::new(
        EngineConfig {
            precursor_tolerance_bins: 10,
            min_comparisons: 1,
            noise_filter_increment: 100,
        },
        CombinedFisherIntensityTest::default(),
        Box::new(ShareHighestPeaksClusterPredicate::default()),
        None,
        CancelToken::new(),
    )
}

/// (S1) Single spectrum, single cluster: one MGF block, 40 peaks,
/// precursor 500.25/charge 2 should seed exactly one cluster with one
/// member whose representative mirrors the per-bin-filtered input.
#[test]
fn single_spectrum_produces_single_cluster() {
    let mgf = mgf_block("spec1", 500.25, 2, 40);
    let mut reader = MgfReader::new(Cursor::new(mgf)).expect("well-formed MGF");
    let (filters, binner, normalizer, per_bin_filter) = standard_pipeline();

    let mut engine = standard_engine();
    let mut n_processed = 0;
    while let Some(record) = reader.next_record().expect("parse") {
        if let Some(spectrum) = prepare_spectrum(record, &filters, &binner, &normalizer, &per_bin_filter) {
            engine.process_spectrum(spectrum);
            n_processed += 1;
        }
    }
    engine.finish();

    assert_eq!(n_processed, 1);
    let emitted = engine.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].member_count(), 1);
}

/// (S2) Two identical spectra merge into one cluster with 2 members;
/// the consensus precursor bin matches `round(precursor_mz * 1000)`.
#[test]
fn two_identical_spectra_merge_into_one_cluster() {
    let mgf = format!(
        "{}{}",
        mgf_block("spec1", 500.25, 2, 40),
        mgf_block("spec2", 500.25, 2, 40)
    );
    let mut reader = MgfReader::new(Cursor::new(mgf)).expect("well-formed MGF");
    let (filters, binner, normalizer, per_bin_filter) = standard_pipeline();

    let mut engine = standard_engine();
    while let Some(record) = reader.next_record().expect("parse") {
        if let Some(spectrum) = prepare_spectrum(record, &filters, &binner, &normalizer, &per_bin_filter) {
            engine.process_spectrum(spectrum);
        }
    }
    engine.finish();

    let emitted = engine.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].member_count(), 2);
    assert_eq!(emitted[0].precursor_mz_bin(), 500_250);
}

/// (S3) Two spectra with far-apart precursors (delta far beyond
/// `Δ_p = 10` bins) end up in two distinct clusters with no
/// comparisons recorded between them.
#[test]
fn far_apart_precursors_form_distinct_clusters_with_no_comparisons() {
    let mgf = format!(
        "{}{}",
        mgf_block("spec1", 500.25, 2, 40),
        mgf_block("spec2", 900.10, 2, 40)
    );
    let mut reader = MgfReader::new(Cursor::new(mgf)).expect("well-formed MGF");
    let (filters, binner, normalizer, per_bin_filter) = standard_pipeline();

    let mut engine = standard_engine();
    while let Some(record) = reader.next_record().expect("parse") {
        if let Some(spectrum) = prepare_spectrum(record, &filters, &binner, &normalizer, &per_bin_filter) {
            engine.process_spectrum(spectrum);
        }
    }
    engine.finish();

    let emitted = engine.emitted();
    assert_eq!(emitted.len(), 2);
    for cluster in emitted.iter() {
        assert_eq!(cluster.n_comparisons(), 0);
    }
}

/// (S4) The known-comparison predicate is false until one side records
/// a comparison, then true in both directions.
#[test]
fn known_comparison_predicate_flips_symmetric_after_recording() {
    use spectra_cluster::cluster::Cluster;
    use spectra_cluster::predicate::{ClusterIsKnownComparisonPredicate, ClusterPredicate, ClusterView};
    use std::collections::HashSet;

    let mut c1 = Cluster::new("c1".to_string(), 100);
    let mut c2 = Cluster::new("c2".to_string(), 100);

    let predicate = ClusterIsKnownComparisonPredicate;
    let empty: HashSet<String> = HashSet::new();
    let empty2: HashSet<String> = HashSet::new();

    let view1 = ClusterView { id: "c1", mz: &[], intensity: &[], best_match_ids: &empty };
    let view2 = ClusterView { id: "c2", mz: &[], intensity: &[], best_match_ids: &empty2 };
    assert!(!predicate.accept(&view1, &view2));

    c1.save_comparison_result("c2".to_string(), 1.0);
    let c1_best = c1.best_match_id_index().clone();
    let view1_after = ClusterView { id: "c1", mz: &[], intensity: &[], best_match_ids: &c1_best };
    let c2_best = c2.best_match_id_index().clone();
    let view2_after = ClusterView { id: "c2", mz: &[], intensity: &[], best_match_ids: &c2_best };

    assert!(predicate.accept(&view1_after, &view2_after));
    assert!(predicate.accept(&view2_after, &view1_after));
}

/// End-to-end round trip: cluster two files' worth of spectra, persist
/// every emitted cluster to a dynamic on-disk store, and confirm the
/// store reports the right entry count and returns bit-identical
/// member sets after a fresh open.
#[test]
fn emitted_clusters_round_trip_through_dynamic_store() {
    let mgf = format!(
        "{}{}{}",
        mgf_block("spec1", 500.25, 2, 40),
        mgf_block("spec2", 500.25, 2, 40),
        mgf_block("spec3", 900.10, 3, 40)
    );
    let mut reader = MgfReader::new(Cursor::new(mgf)).expect("well-formed MGF");
    let (filters, binner, normalizer, per_bin_filter) = standard_pipeline();

    let mut engine = standard_engine();
    while let Some(record) = reader.next_record().expect("parse") {
        if let Some(spectrum) = prepare_spectrum(record, &filters, &binner, &normalizer, &per_bin_filter) {
            engine.process_spectrum(spectrum);
        }
    }
    engine.finish();
    let clusters = std::mem::take(engine.emitted());
    assert_eq!(clusters.len(), 2);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.cls");
    {
        let mut store = DynamicClusterStore::open(&path, 100).expect("open");
        for cluster in &clusters {
            store.put(cluster.id(), cluster).expect("put");
        }
        store.close().expect("close");
    }

    let mut reopened = DynamicClusterStore::open(&path, 100).expect("reopen");
    assert_eq!(reopened.size(), 2);
    for cluster in &clusters {
        let fetched = reopened.get(cluster.id()).expect("get").expect("present");
        assert_eq!(fetched.member_ids(), cluster.member_ids());
    }
}

/// Output ordering guarantee holds across a mixed-order input stream
/// spanning three well-separated precursor groups.
#[test]
fn emission_order_is_non_decreasing_in_precursor_bin_across_a_run() {
    let mgf = format!(
        "{}{}{}",
        mgf_block("high", 900.0, 2, 40),
        mgf_block("low", 300.0, 2, 40),
        mgf_block("mid", 600.0, 2, 40)
    );
    let mut reader = MgfReader::new(Cursor::new(mgf)).expect("well-formed MGF");
    let (filters, binner, normalizer, per_bin_filter) = standard_pipeline();

    let mut engine = standard_engine();
    while let Some(record) = reader.next_record().expect("parse") {
        if let Some(spectrum) = prepare_spectrum(record, &filters, &binner, &normalizer, &per_bin_filter) {
            engine.process_spectrum(spectrum);
        }
    }
    engine.finish();

    let bins: Vec<i32> = engine.emitted().iter().map(|c| c.precursor_mz_bin()).collect();
    let mut sorted = bins.clone();
    sorted.sort();
    assert_eq!(bins, sorted);
}
