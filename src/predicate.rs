//! Cheap pre-filters applied before the expensive similarity scorer
//! (§4.6). Unlike [`crate::filters::SpectrumFilter`], this is a closed
//! set — two variants cover the documented protocol, so a plain enum
//! would also fit, but a trait keeps the engine's call site uniform and
//! leaves room for a third variant without touching `engine`.

use std::collections::HashSet;

/// A read-only view of the data a predicate needs, decoupled from
/// [`crate::cluster::Cluster`]'s mutable representative cache so
/// predicates stay trivially testable against bare slices.
pub struct ClusterView<'a> {
    pub id: &'a str,
    pub mz: &'a [i32],
    pub intensity: &'a [i32],
    pub best_match_ids: &'a HashSet<String>,
}

/// A cheap accept/reject gate evaluated before scoring a candidate pair.
pub trait ClusterPredicate: Send + Sync {
    fn accept(&self, a: &ClusterView, b: &ClusterView) -> bool;
}

/// Accepts a pair iff their top-`k` most intense peaks share at least
/// one `mz_bin`. Commutative by construction (§8 invariant 8).
#[derive(Debug, Clone, Copy)]
pub struct ShareHighestPeaksClusterPredicate {
    pub k: usize,
}

impl Default for ShareHighestPeaksClusterPredicate {
    fn default() -> Self {
        Self { k: 5 }
    }
}

impl ShareHighestPeaksClusterPredicate {
    fn top_k_bins(&self, mz: &[i32], intensity: &[i32]) -> HashSet<i32> {
        let mut idx: Vec<usize> = (0..mz.len()).collect();
        idx.sort_by(|&i, &j| {
            intensity[j]
                .cmp(&intensity[i])
                .then(mz[i].cmp(&mz[j]))
        });
        idx.truncate(self.k);
        idx.into_iter().map(|i| mz[i]).collect()
    }
}

impl ClusterPredicate for ShareHighestPeaksClusterPredicate {
    fn accept(&self, a: &ClusterView, b: &ClusterView) -> bool {
        let top_a = self.top_k_bins(a.mz, a.intensity);
        let top_b = self.top_k_bins(b.mz, b.intensity);
        top_a.intersection(&top_b).next().is_some()
    }
}

/// Accepts a pair iff either side already lists the other in its
/// best-matches (symmetric by construction). Used to skip re-scoring
/// pairs a previous pass already evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterIsKnownComparisonPredicate;

impl ClusterPredicate for ClusterIsKnownComparisonPredicate {
    fn accept(&self, a: &ClusterView, b: &ClusterView) -> bool {
        a.best_match_ids.contains(b.id) || b.best_match_ids.contains(a.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(id: &'a str, mz: &'a [i32], intensity: &'a [i32], best: &'a HashSet<String>) -> ClusterView<'a> {
        ClusterView {
            id,
            mz,
            intensity,
            best_match_ids: best,
        }
    }

    #[test]
    fn share_highest_peaks_is_symmetric() {
        let predicate = ShareHighestPeaksClusterPredicate { k: 2 };
        let empty = HashSet::new();
        let a_mz = vec![1, 2, 3, 4];
        let a_int = vec![10, 100, 5, 90];
        let b_mz = vec![2, 5, 6, 7];
        let b_int = vec![50, 1, 2, 3];

        let a = view("a", &a_mz, &a_int, &empty);
        let b = view("b", &b_mz, &b_int, &empty);
        assert_eq!(predicate.accept(&a, &b), predicate.accept(&b, &a));
    }

    #[test]
    fn share_highest_peaks_accepts_on_overlap() {
        let predicate = ShareHighestPeaksClusterPredicate { k: 2 };
        let empty = HashSet::new();
        let a_mz = vec![1, 2, 3];
        let a_int = vec![100, 90, 1];
        let b_mz = vec![2, 9, 10];
        let b_int = vec![80, 1, 1];

        let a = view("a", &a_mz, &a_int, &empty);
        let b = view("b", &b_mz, &b_int, &empty);
        assert!(predicate.accept(&a, &b));
    }

    #[test]
    fn share_highest_peaks_rejects_disjoint_tops() {
        let predicate = ShareHighestPeaksClusterPredicate { k: 1 };
        let empty = HashSet::new();
        let a_mz = vec![1, 2];
        let a_int = vec![100, 1];
        let b_mz = vec![5, 6];
        let b_int = vec![100, 1];

        let a = view("a", &a_mz, &a_int, &empty);
        let b = view("b", &b_mz, &b_int, &empty);
        assert!(!predicate.accept(&a, &b));
    }

    #[test]
    fn known_comparison_is_symmetric_after_one_side_records() {
        let predicate = ClusterIsKnownComparisonPredicate;
        let mut known_by_a: HashSet<String> = HashSet::new();
        known_by_a.insert("b".to_string());
        let empty = HashSet::new();

        let a = view("a", &[], &[], &known_by_a);
        let b = view("b", &[], &[], &empty);
        assert!(predicate.accept(&a, &b));
        assert!(predicate.accept(&b, &a));
    }

    #[test]
    fn known_comparison_false_when_neither_recorded() {
        let predicate = ClusterIsKnownComparisonPredicate;
        let empty = HashSet::new();
        let a = view("a", &[], &[], &empty);
        let b = view("b", &[], &[], &empty);
        assert!(!predicate.accept(&a, &b));
    }
}
