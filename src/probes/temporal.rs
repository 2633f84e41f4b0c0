//! Temporal probe over a sampled frame sequence: inter-frame difference
//! statistics, noise-residual correlation, and luminance flicker.
//!
//! The flicker band is defined in hertz against an assumed 30 fps; the
//! container's real frame rate is not probed. Sequences sampled from
//! differently-paced sources shift the band accordingly.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::media::{Plane, RgbFrame};
use crate::primitives::spectral::dft_magnitudes;
use crate::primitives::{noise_residual, to_gray};
use crate::stats;

const ASSUMED_FPS: f64 = 30.0;
const FLICKER_BAND_HZ: (f64, f64) = (2.0, 5.0);
const MIN_FLICKER_FRAMES: usize = 10;
const EPSILON: f64 = 1e-10;

#[derive(Clone, Debug, Default, Serialize)]
pub struct TemporalNoiseScan {
    pub temporal_noise_std: f64,
    pub is_anomaly: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct FrameCorrelationScan {
    pub avg_correlation: f64,
    pub is_anomaly: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct FlickerScan {
    pub flicker_detected: bool,
    pub peak_frequency: f64,
    pub peak_strength: f64,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TemporalDetails {
    pub temporal_noise: TemporalNoiseScan,
    pub frame_correlation: FrameCorrelationScan,
    pub flicker: FlickerScan,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TemporalReport {
    pub temporal_flicker: bool,
    pub temporal_noise_anomaly: bool,
    pub details: TemporalDetails,
}

pub fn analyze(frames: &[RgbFrame], cfg: &DetectorConfig) -> TemporalReport {
    let grays: Vec<Plane> = frames.iter().map(to_gray).collect();

    let temporal_noise = scan_temporal_noise(&grays, cfg);
    let frame_correlation = scan_frame_correlation(frames, cfg);
    let flicker = scan_flicker(&grays, cfg);

    TemporalReport {
        temporal_flicker: flicker.flicker_detected,
        temporal_noise_anomaly: temporal_noise.is_anomaly,
        details: TemporalDetails {
            temporal_noise,
            frame_correlation,
            flicker,
        },
    }
}

/// Standard deviation of the per-pair |frame difference| noise levels.
/// Real footage sits in a band; generative output drifts out either side.
fn scan_temporal_noise(grays: &[Plane], cfg: &DetectorConfig) -> TemporalNoiseScan {
    if grays.len() < 2 {
        return TemporalNoiseScan::default();
    }
    let noise_levels: Vec<f32> = grays
        .windows(2)
        .map(|pair| {
            let diffs: Vec<f32> = pair[0]
                .data()
                .iter()
                .zip(pair[1].data().iter())
                .map(|(&a, &b)| (a - b).abs())
                .collect();
            stats::std_dev(&diffs) as f32
        })
        .collect();
    let temporal_noise_std = stats::std_dev(&noise_levels);

    let is_anomaly = temporal_noise_std < cfg.thresholds.temporal_noise_min
        || temporal_noise_std > cfg.thresholds.temporal_noise_max;
    TemporalNoiseScan {
        temporal_noise_std,
        is_anomaly,
        confidence: if is_anomaly { 0.7 } else { 0.0 },
    }
}

/// Mean correlation between the noise residuals of adjacent frames.
/// Residuals are computed pairwise so only two are alive at a time.
fn scan_frame_correlation(frames: &[RgbFrame], cfg: &DetectorConfig) -> FrameCorrelationScan {
    if frames.len() < 2 {
        return FrameCorrelationScan::default();
    }
    let mut correlations = Vec::with_capacity(frames.len() - 1);
    let mut prev = noise_residual(&frames[0]);
    for frame in &frames[1..] {
        let current = noise_residual(frame);
        correlations.push(stats::pearson(&prev, &current) as f32);
        prev = current;
    }
    let avg_correlation = stats::mean(&correlations);

    let is_anomaly = avg_correlation < cfg.thresholds.frame_correlation_min
        || avg_correlation > cfg.thresholds.frame_correlation_max;
    FrameCorrelationScan {
        avg_correlation,
        is_anomaly,
        confidence: if is_anomaly { 0.6 } else { 0.0 },
    }
}

/// DFT of the per-frame mean luminance; a dominant bin in the 2-5 Hz band
/// (at the assumed frame rate) marks diffusion-style flicker.
fn scan_flicker(grays: &[Plane], cfg: &DetectorConfig) -> FlickerScan {
    let n = grays.len();
    if n < MIN_FLICKER_FRAMES {
        return FlickerScan::default();
    }
    let series: Vec<f32> = grays
        .iter()
        .map(|gray| stats::mean(gray.data()) as f32)
        .collect();
    let magnitudes = dft_magnitudes(&series);

    // Positive-frequency bins inside the flicker band.
    let mut peak_strength_raw = 0.0f64;
    let mut peak_frequency = 0.0f64;
    let mut any_in_band = false;
    for (i, &mag) in magnitudes.iter().enumerate().take(n.div_ceil(2)) {
        let freq = i as f64 * ASSUMED_FPS / n as f64;
        if freq < FLICKER_BAND_HZ.0 || freq > FLICKER_BAND_HZ.1 {
            continue;
        }
        any_in_band = true;
        if mag as f64 > peak_strength_raw {
            peak_strength_raw = mag as f64;
            peak_frequency = freq;
        }
    }
    if !any_in_band {
        return FlickerScan::default();
    }

    let mean_magnitude =
        magnitudes.iter().map(|&m| m as f64).sum::<f64>() / magnitudes.len() as f64;
    let peak_strength = peak_strength_raw / (mean_magnitude + EPSILON);

    let flicker_detected = peak_strength > cfg.thresholds.flicker_peak_ratio;
    FlickerScan {
        flicker_detected,
        peak_frequency,
        peak_strength,
        confidence: if flicker_detected {
            (peak_strength / 5.0).min(1.0)
        } else {
            0.0
        },
    }
}
