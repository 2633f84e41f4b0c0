//! Geometry probe: edge continuity, mirror symmetry, and Hough angle
//! dispersion. Only the fragmentation signal feeds the decision engine.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::media::Plane;
use crate::media::RgbFrame;
use crate::primitives::edges::{canny, hough_lines, hough_segments, EdgeMap};
use crate::primitives::to_gray;
use crate::stats;

const CANNY_LO: f32 = 50.0;
const CANNY_HI: f32 = 150.0;
const SEGMENT_VOTES: u32 = 50;
const SEGMENT_MIN_LENGTH: f64 = 30.0;
const SEGMENT_MAX_GAP: u32 = 10;
const PERSPECTIVE_VOTES: u32 = 100;
const PERSPECTIVE_MAX_LINES: usize = 20;

#[derive(Clone, Debug, Default, Serialize)]
pub struct ContinuityScan {
    pub continuity_score: f64,
    pub num_lines: usize,
    pub avg_line_length: f64,
    pub is_fragmented: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SymmetryScan {
    pub horizontal_symmetry: f64,
    pub vertical_symmetry: f64,
    pub is_unnatural: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PerspectiveScan {
    pub angle_std: f64,
    pub is_inconsistent: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GeometryDetails {
    pub edge_coherence: ContinuityScan,
    pub symmetry: SymmetryScan,
    pub perspective: PerspectiveScan,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GeometryReport {
    pub edge_fragmented: bool,
    pub details: GeometryDetails,
}

pub fn analyze(frame: &RgbFrame, cfg: &DetectorConfig) -> GeometryReport {
    let gray = to_gray(frame);
    let edges = canny(&gray, CANNY_LO, CANNY_HI);

    let edge_coherence = scan_continuity(&edges, cfg);
    let symmetry = scan_symmetry(&gray, cfg);
    let perspective = scan_perspective(&edges, cfg);

    GeometryReport {
        edge_fragmented: edge_coherence.is_fragmented,
        details: GeometryDetails {
            edge_coherence,
            symmetry,
            perspective,
        },
    }
}

/// Mean traced-segment length, clamped to a 0..1 continuity score. No
/// segments at all counts as fully fragmented.
fn scan_continuity(edges: &EdgeMap, cfg: &DetectorConfig) -> ContinuityScan {
    let segments = hough_segments(edges, SEGMENT_VOTES, SEGMENT_MIN_LENGTH, SEGMENT_MAX_GAP);
    if segments.is_empty() {
        return ContinuityScan {
            continuity_score: 0.0,
            num_lines: 0,
            avg_line_length: 0.0,
            is_fragmented: true,
            confidence: 0.5,
        };
    }
    let avg_line_length =
        segments.iter().map(|s| s.length()).sum::<f64>() / segments.len() as f64;
    let continuity_score = (avg_line_length / 100.0).min(1.0);
    let is_fragmented = continuity_score < cfg.thresholds.edge_continuity_ai_max;
    ContinuityScan {
        continuity_score,
        num_lines: segments.len(),
        avg_line_length,
        is_fragmented,
        confidence: if is_fragmented { 0.5 } else { 0.0 },
    }
}

/// Correlation between each half and its mirrored opposite.
fn scan_symmetry(gray: &Plane, cfg: &DetectorConfig) -> SymmetryScan {
    let (w, h) = (gray.width(), gray.height());
    if w < 2 || h < 2 {
        return SymmetryScan::default();
    }

    let left = gray.crop(0, 0, w / 2, h);
    let right = flip_horizontal(&gray.crop(w / 2, 0, w - w / 2, h));
    let half_w = left.width().min(right.width());
    let horizontal_symmetry = stats::pearson(
        gray_window(&left, half_w, h).data(),
        gray_window(&right, half_w, h).data(),
    );

    let top = gray.crop(0, 0, w, h / 2);
    let bottom = flip_vertical(&gray.crop(0, h / 2, w, h - h / 2));
    let half_h = top.height().min(bottom.height());
    let vertical_symmetry = stats::pearson(
        gray_window(&top, w, half_h).data(),
        gray_window(&bottom, w, half_h).data(),
    );

    let max_symmetry = horizontal_symmetry.max(vertical_symmetry);
    let is_unnatural = max_symmetry > cfg.thresholds.symmetry_max;
    SymmetryScan {
        horizontal_symmetry,
        vertical_symmetry,
        is_unnatural,
        confidence: if is_unnatural { 0.4 } else { 0.0 },
    }
}

fn gray_window(plane: &Plane, w: usize, h: usize) -> Plane {
    if plane.width() == w && plane.height() == h {
        plane.clone()
    } else {
        plane.crop(0, 0, w, h)
    }
}

fn flip_horizontal(plane: &Plane) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    let mut out = Plane::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set(w - 1 - x, y, plane.at(x, y));
        }
    }
    out
}

fn flip_vertical(plane: &Plane) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    let mut out = Plane::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set(x, h - 1 - y, plane.at(x, y));
        }
    }
    out
}

/// Dispersion of the strongest Hough line angles. Fewer than four lines is
/// treated as consistent.
fn scan_perspective(edges: &EdgeMap, cfg: &DetectorConfig) -> PerspectiveScan {
    let lines = hough_lines(edges, PERSPECTIVE_VOTES);
    if lines.len() < 4 {
        return PerspectiveScan::default();
    }
    let angles: Vec<f32> = lines
        .iter()
        .take(PERSPECTIVE_MAX_LINES)
        .map(|line| line.theta)
        .collect();
    let angle_std = stats::std_dev(&angles);
    let is_inconsistent = angle_std > cfg.thresholds.perspective_angle_std_max;
    PerspectiveScan {
        angle_std,
        is_inconsistent,
        confidence: if is_inconsistent { 0.3 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DetectorConfig {
        DetectorConfig::default()
    }

    fn frame_from_gray(w: u32, h: u32, f: impl Fn(u32, u32) -> u8) -> RgbFrame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = f(x, y);
                data.extend_from_slice(&[v, v, v]);
            }
        }
        RgbFrame::new(data, w, h).unwrap()
    }

    #[test]
    fn featureless_frame_reads_as_fragmented() {
        let frame = frame_from_gray(64, 64, |_, _| 128);
        let report = analyze(&frame, &cfg());
        let coherence = &report.details.edge_coherence;
        assert!(report.edge_fragmented);
        assert_eq!(coherence.num_lines, 0);
        assert_eq!(coherence.continuity_score, 0.0);
        assert_eq!(coherence.confidence, 0.5);
    }

    #[test]
    fn long_clean_edge_is_coherent() {
        // A single vertical step spanning the full frame traces a segment
        // far longer than the fragmentation cutoff.
        let frame = frame_from_gray(128, 128, |x, _| if x < 64 { 30 } else { 220 });
        let report = analyze(&frame, &cfg());
        let coherence = &report.details.edge_coherence;
        assert!(!report.edge_fragmented);
        assert!(coherence.num_lines >= 1);
        assert!(coherence.avg_line_length > 100.0);
        assert_eq!(coherence.continuity_score, 1.0);
    }

    #[test]
    fn mirrored_texture_is_flagged_symmetric() {
        // Texture mirrored around the vertical midline.
        let frame = frame_from_gray(64, 64, |x, y| {
            let mx = if x < 32 { x } else { 63 - x };
            ((mx * 5 + y * 3) % 220) as u8
        });
        let report = analyze(&frame, &cfg());
        let symmetry = &report.details.symmetry;
        assert!(symmetry.horizontal_symmetry > 0.95);
        assert!(symmetry.is_unnatural);
    }

    #[test]
    fn sparse_edges_skip_perspective() {
        let frame = frame_from_gray(32, 32, |_, _| 77);
        let report = analyze(&frame, &cfg());
        let perspective = &report.details.perspective;
        assert!(!perspective.is_inconsistent);
        assert_eq!(perspective.angle_std, 0.0);
    }
}
