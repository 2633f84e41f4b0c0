//! Noise probe: residual statistics and pixel-distribution tests.
//!
//! Only the low-variance signal is wired into the decision engine; the
//! entropy, homogeneity and chi-square scans are reported for the evidence
//! trail.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::media::RgbFrame;
use crate::primitives::{noise_residual, to_gray};
use crate::stats;

const BLOCK_SIZE: usize = 32;
const EPSILON: f64 = 1e-10;

#[derive(Clone, Debug, Default, Serialize)]
pub struct VarianceScan {
    pub variance: f64,
    pub is_low: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EntropyScan {
    pub entropy: f64,
    pub is_low: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct HomogeneityScan {
    pub variance_of_variances: f64,
    pub is_unnatural: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ChiSquareScan {
    pub chi_square: f64,
    pub is_anomaly: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NoiseDetails {
    pub variance: VarianceScan,
    pub entropy: EntropyScan,
    pub local_variance: HomogeneityScan,
    pub chi_square: ChiSquareScan,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NoiseReport {
    pub noise_variance_low: bool,
    pub details: NoiseDetails,
}

pub fn analyze(frame: &RgbFrame, cfg: &DetectorConfig) -> NoiseReport {
    let residual = noise_residual(frame);
    let gray = to_gray(frame);

    let variance = scan_variance(&residual, cfg);
    let entropy = scan_entropy(&residual, cfg);
    let local_variance = scan_homogeneity(&gray, cfg);
    let chi_square = scan_chi_square(&gray, cfg);

    NoiseReport {
        noise_variance_low: variance.is_low,
        details: NoiseDetails {
            variance,
            entropy,
            local_variance,
            chi_square,
        },
    }
}

fn scan_variance(residual: &[f32], cfg: &DetectorConfig) -> VarianceScan {
    let variance = stats::variance(residual);
    let is_low = variance < cfg.thresholds.noise_variance_ai_max;
    VarianceScan {
        variance,
        is_low,
        confidence: if is_low { 0.7 } else { 0.0 },
    }
}

fn scan_entropy(residual: &[f32], cfg: &DetectorConfig) -> EntropyScan {
    let hist = stats::histogram(residual, 256, -128.0, 128.0);
    let entropy = stats::shannon_entropy(&hist);
    let is_low = entropy < cfg.thresholds.noise_entropy_min;
    EntropyScan {
        entropy,
        is_low,
        confidence: if is_low { 0.5 } else { 0.0 },
    }
}

/// Variance of per-block variances over non-overlapping 32x32 grayscale
/// tiles; a near-constant variance field reads as synthetic smoothing.
fn scan_homogeneity(gray: &crate::media::Plane, cfg: &DetectorConfig) -> HomogeneityScan {
    let (w, h) = (gray.width(), gray.height());
    let mut block_variances = Vec::new();
    let mut y = 0;
    while y + BLOCK_SIZE < h {
        let mut x = 0;
        while x + BLOCK_SIZE < w {
            let block = gray.crop(x, y, BLOCK_SIZE, BLOCK_SIZE);
            block_variances.push(stats::variance(block.data()) as f32);
            x += BLOCK_SIZE;
        }
        y += BLOCK_SIZE;
    }
    if block_variances.is_empty() {
        return HomogeneityScan::default();
    }
    let variance_of_variances = stats::variance(&block_variances);
    let is_unnatural = variance_of_variances < cfg.thresholds.noise_homogeneity_min;
    HomogeneityScan {
        variance_of_variances,
        is_unnatural,
        confidence: if is_unnatural { 0.4 } else { 0.0 },
    }
}

fn scan_chi_square(gray: &crate::media::Plane, cfg: &DetectorConfig) -> ChiSquareScan {
    let n = gray.len() as f64;
    if n == 0.0 {
        return ChiSquareScan::default();
    }
    let hist = stats::histogram(gray.data(), 256, 0.0, 256.0);
    let expected = n / 256.0;
    let chi_square: f64 = hist
        .iter()
        .map(|&count| {
            let diff = count as f64 - expected;
            diff * diff / (expected + EPSILON)
        })
        .sum::<f64>()
        / n;
    let is_anomaly = chi_square < cfg.thresholds.pixel_chi_square_min;
    ChiSquareScan {
        chi_square,
        is_anomaly,
        confidence: if is_anomaly { 0.3 } else { 0.0 },
    }
}
