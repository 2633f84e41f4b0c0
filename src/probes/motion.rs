//! Motion probe: dense-flow magnitude statistics across a sampled frame
//! sequence. Flow magnitudes are pixel displacements; see
//! [`crate::primitives::flow`] for the backend and its calibration note.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::media::{Plane, RgbFrame};
use crate::primitives::flow::dense_flow;
use crate::primitives::to_gray;
use crate::stats;

#[derive(Clone, Debug, Default, Serialize)]
pub struct VectorScan {
    pub motion_variance: f64,
    pub is_irregular: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SmoothnessScan {
    pub avg_motion_diff: f64,
    pub is_unnatural: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MotionDetails {
    pub motion_vectors: VectorScan,
    pub motion_smoothness: SmoothnessScan,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MotionReport {
    pub motion_vector_irregular: bool,
    pub details: MotionDetails,
}

pub fn analyze(frames: &[RgbFrame], cfg: &DetectorConfig) -> MotionReport {
    if frames.len() < 2 {
        return MotionReport::default();
    }
    let grays: Vec<Plane> = frames.iter().map(to_gray).collect();

    // One flow field per adjacent pair; only two magnitude planes are kept
    // alive at a time.
    let mut mean_magnitudes: Vec<f32> = Vec::with_capacity(grays.len() - 1);
    let mut pairwise_diffs: Vec<f32> = Vec::new();
    let mut prev_magnitude: Option<Plane> = None;
    for pair in grays.windows(2) {
        let (magnitude, _) = dense_flow(&pair[0], &pair[1]);
        mean_magnitudes.push(stats::mean(magnitude.data()) as f32);
        if let Some(prev) = &prev_magnitude {
            let diff: f64 = prev
                .data()
                .iter()
                .zip(magnitude.data().iter())
                .map(|(&a, &b)| (a - b).abs() as f64)
                .sum::<f64>()
                / magnitude.len() as f64;
            pairwise_diffs.push(diff as f32);
        }
        prev_magnitude = Some(magnitude);
    }

    let motion_vectors = scan_vectors(&mean_magnitudes, cfg);
    let motion_smoothness = scan_smoothness(&pairwise_diffs, cfg);

    MotionReport {
        motion_vector_irregular: motion_vectors.is_irregular,
        details: MotionDetails {
            motion_vectors,
            motion_smoothness,
        },
    }
}

/// Variance of per-pair mean flow magnitude: erratic or suspiciously flat
/// motion both read as irregular.
fn scan_vectors(mean_magnitudes: &[f32], cfg: &DetectorConfig) -> VectorScan {
    if mean_magnitudes.is_empty() {
        return VectorScan::default();
    }
    let motion_variance = stats::variance(mean_magnitudes);
    let is_irregular = motion_variance < cfg.thresholds.motion_variance_min
        || motion_variance > cfg.thresholds.motion_variance_max;
    VectorScan {
        motion_variance,
        is_irregular,
        confidence: if is_irregular { 0.6 } else { 0.0 },
    }
}

/// Mean per-pixel change between consecutive flow fields.
fn scan_smoothness(pairwise_diffs: &[f32], cfg: &DetectorConfig) -> SmoothnessScan {
    if pairwise_diffs.is_empty() {
        return SmoothnessScan::default();
    }
    let avg_motion_diff = stats::mean(pairwise_diffs);
    let is_unnatural = avg_motion_diff < cfg.thresholds.motion_smoothness_min;
    SmoothnessScan {
        avg_motion_diff,
        is_unnatural,
        confidence: if is_unnatural { 0.5 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DetectorConfig {
        DetectorConfig::default()
    }

    fn square_frame(sq_x: usize) -> RgbFrame {
        let (w, h) = (64usize, 64usize);
        let mut data = vec![20u8; w * h * 3];
        for y in 20..28 {
            for x in sq_x..(sq_x + 8).min(w) {
                let idx = (y * w + x) * 3;
                data[idx] = 230;
                data[idx + 1] = 230;
                data[idx + 2] = 230;
            }
        }
        RgbFrame::new(data, w as u32, h as u32).unwrap()
    }

    #[test]
    fn single_frame_is_benign() {
        let report = analyze(&[square_frame(10)], &cfg());
        assert!(!report.motion_vector_irregular);
        assert_eq!(report.details.motion_vectors.confidence, 0.0);
    }

    #[test]
    fn static_sequence_has_flat_motion() {
        let frames: Vec<RgbFrame> = (0..5).map(|_| square_frame(20)).collect();
        let report = analyze(&frames, &cfg());
        let vectors = &report.details.motion_vectors;
        assert_eq!(vectors.motion_variance, 0.0);
        assert!(vectors.is_irregular);
        assert!(report.details.motion_smoothness.is_unnatural);
    }

    #[test]
    fn stop_and_go_motion_raises_the_variance() {
        // The bright square holds still, jumps 8 px, holds, jumps back:
        // per-pair mean magnitude alternates zero/high.
        let frames: Vec<RgbFrame> = [10, 10, 18, 18, 10]
            .into_iter()
            .map(square_frame)
            .collect();
        let report = analyze(&frames, &cfg());
        let vectors = &report.details.motion_vectors;
        assert!(vectors.motion_variance > 0.0);
        assert!(!report.details.motion_smoothness.is_unnatural);
    }
}
