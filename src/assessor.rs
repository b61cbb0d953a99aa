//! Number-of-comparisons similarity threshold assessor (§4.4).

/// Frozen `(nComparisons, threshold)` step table, sorted ascending by
/// `n`. Re-exported as data rather than generated code, per Design
/// Note 9-iii — this is the kind of table that would otherwise be
/// shipped as an embedded resource file.
///
/// Entries below `n=1000` are steep (few comparisons give little
/// statistical confidence, so the bar for calling a match is high);
/// above `n=10000` the table flattens since additional comparisons stop
/// moving the estimate much.
pub static DEFAULT_THRESHOLD_TABLE: &[(u32, f32)] = &[
    (1, 0.99),
    (10, 0.95),
    (50, 0.90),
    (100, 0.85),
    (250, 0.80),
    (500, 0.75),
    (1000, 0.70),
    (2500, 0.65),
    (5000, 0.60),
    (10000, 0.55),
    (25000, 0.50),
    (50000, 0.45),
];

/// Maps the number of comparisons a cluster has undergone to the
/// similarity threshold required to call a match. Below `minComparisons`
/// the threshold parameterized for `minComparisons` is used instead,
/// since few comparisons give an unreliable estimate of how selective
/// the threshold should be.
#[derive(Debug, Clone)]
pub struct MinNumberComparisonsAssessor {
    min_comparisons: u32,
    table: &'static [(u32, f32)],
}

impl MinNumberComparisonsAssessor {
    pub fn new(min_comparisons: u32) -> Self {
        Self {
            min_comparisons,
            table: DEFAULT_THRESHOLD_TABLE,
        }
    }

    /// Construct with an explicit table, for tests or alternative
    /// calibrations. `table` must be sorted ascending by `n`.
    pub fn with_table(min_comparisons: u32, table: &'static [(u32, f32)]) -> Self {
        Self {
            min_comparisons,
            table,
        }
    }

    /// The threshold for `n` observed comparisons. Exact matches in the
    /// table take precedence; otherwise the threshold for the largest
    /// tabulated `n` not exceeding the (possibly floored) comparison
    /// count is used — a monotonically non-increasing step function.
    pub fn threshold(&self, n: u32) -> f32 {
        let n = n.max(self.min_comparisons);
        if let Some(&(_, t)) = self.table.iter().find(|&&(tn, _)| tn == n) {
            return t;
        }
        self.table
            .iter()
            .rev()
            .find(|&&(tn, _)| tn <= n)
            .map(|&(_, t)| t)
            .unwrap_or_else(|| self.table.first().map(|&(_, t)| t).unwrap_or(1.0))
    }
}
