//! Intensity normalizers: ordered list of raw intensities -> integer
//! vector of equal length.

/// A closed set of intensity normalization policies. Closed because the
/// engine only ever needs these four variants (Design Note 9); new
/// variants would change the testable variance ordering in §8 invariant 7.
pub trait IntensityNormalizer {
    /// Normalize intensities, preserving input order.
    fn normalize(&self, intensities: &[f64]) -> Vec<i32>;
}

fn clip_to_i32(v: f64) -> i32 {
    v.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// `round(I * scale)`, clipped to `i32`.
#[derive(Debug, Clone, Copy)]
pub struct BasicIntegerNormalizer {
    pub scale: f64,
}

impl IntensityNormalizer for BasicIntegerNormalizer {
    fn normalize(&self, intensities: &[f64]) -> Vec<i32> {
        intensities
            .iter()
            .map(|i| clip_to_i32((i * self.scale).round()))
            .collect()
    }
}

/// Divides by the maximum intensity, then applies [`BasicIntegerNormalizer`].
/// An empty list maps to an empty result; an all-zero list maps to all
/// zeros rather than dividing by zero.
#[derive(Debug, Clone, Copy)]
pub struct MaxPeakNormalizer {
    pub scale: f64,
}

impl IntensityNormalizer for MaxPeakNormalizer {
    fn normalize(&self, intensities: &[f64]) -> Vec<i32> {
        if intensities.is_empty() {
            return Vec::new();
        }
        let max = intensities.iter().cloned().fold(0.0_f64, f64::max);
        if max == 0.0 {
            return vec![0; intensities.len()];
        }
        let scaled: Vec<f64> = intensities.iter().map(|i| i / max).collect();
        BasicIntegerNormalizer { scale: self.scale }.normalize(&scaled)
    }
}

/// `round(log1p(I) * scale)`.
#[derive(Debug, Clone, Copy)]
pub struct LogNormalizer {
    pub scale: f64,
}

impl IntensityNormalizer for LogNormalizer {
    fn normalize(&self, intensities: &[f64]) -> Vec<i32> {
        intensities
            .iter()
            .map(|i| clip_to_i32((i.ln_1p() * self.scale).round()))
            .collect()
    }
}

/// Cumulative-distribution rank: sort ascending, assign
/// `round(cum / total * scale)` by original position.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeIntensityNormalizer {
    pub scale: f64,
}

impl IntensityNormalizer for CumulativeIntensityNormalizer {
    fn normalize(&self, intensities: &[f64]) -> Vec<i32> {
        if intensities.is_empty() {
            return Vec::new();
        }
        let total: f64 = intensities.iter().sum();
        if total == 0.0 {
            return vec![0; intensities.len()];
        }
        let mut order: Vec<usize> = (0..intensities.len()).collect();
        order.sort_by(|&a, &b| {
            intensities[a]
                .partial_cmp(&intensities[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cum_by_index = vec![0.0_f64; intensities.len()];
        let mut running = 0.0_f64;
        for &idx in &order {
            running += intensities[idx];
            cum_by_index[idx] = running;
        }
        cum_by_index
            .into_iter()
            .map(|cum| clip_to_i32((cum / total * self.scale).round()))
            .collect()
    }
}

fn variance(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64
}
