//! Scalar statistics shared by the probes.
//!
//! All helpers are pure and total: degenerate inputs (empty slices,
//! zero-variance series) yield 0.0 instead of NaN so downstream threshold
//! comparisons stay well-defined.

pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Population variance, matching the convention of the reference metrics.
pub fn variance(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v as f64 - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f32]) -> f64 {
    variance(values).sqrt()
}

/// Pearson correlation coefficient. Returns 0.0 when either side has
/// (near-)zero variance or the lengths differ.
pub fn pearson(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);
    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    cov / denom
}

/// Histogram with `bins` equal-width buckets over `[lo, hi)`. Values outside
/// the range are clamped into the edge buckets.
pub fn histogram(values: &[f32], bins: usize, lo: f64, hi: f64) -> Vec<u64> {
    let mut hist = vec![0u64; bins];
    if values.is_empty() || bins == 0 || hi <= lo {
        return hist;
    }
    let scale = bins as f64 / (hi - lo);
    for &v in values {
        let idx = (((v as f64 - lo) * scale) as isize).clamp(0, bins as isize - 1) as usize;
        hist[idx] += 1;
    }
    hist
}

/// Shannon entropy of a count histogram, in nats.
pub fn shannon_entropy(hist: &[u64]) -> f64 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    hist.iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}
