//! Kendall's tau-b on paired, already-matched integer intensities.
//!
//! The primary implementation takes pre-paired arrays (no allocation of
//! intermediate rank structures) since the caller has already walked the
//! two sorted m/z arrays to find shared peaks. A slower, independently
//! structured reference implementation lives in the test module and must
//! agree with it to within `1e-7` (§8 invariant 10).

/// Paired Kendall tau-b, ties handled per Knight's formulation. Returns 0
/// for fewer than two pairs (undefined otherwise).
pub fn kendall_tau_b_pairs(xs: &[i32], ys: &[i32]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }

    let mut concordant: i64 = 0;
    let mut discordant: i64 = 0;
    let mut ties_x: i64 = 0;
    let mut ties_y: i64 = 0;
    let mut ties_both: i64 = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = xs[i].cmp(&xs[j]);
            let dy = ys[i].cmp(&ys[j]);
            match (dx, dy) {
                (std::cmp::Ordering::Equal, std::cmp::Ordering::Equal) => ties_both += 1,
                (std::cmp::Ordering::Equal, _) => ties_x += 1,
                (_, std::cmp::Ordering::Equal) => ties_y += 1,
                (a, b) if a == b => concordant += 1,
                _ => discordant += 1,
            }
        }
    }

    let n0 = (n * (n - 1) / 2) as i64;
    let n1 = ties_x + ties_both;
    let n2 = ties_y + ties_both;
    let denom = ((n0 - n1) as f64 * (n0 - n2) as f64).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (concordant - discordant) as f64 / denom
}
