//! Edge detection and line extraction: Canny and Hough transforms.
//!
//! The segment extractor walks accumulator peaks deterministically instead
//! of sampling edge points at random, so repeated runs over the same input
//! yield identical segments.

use crate::media::Plane;
use crate::primitives::sobel_gradients;

/// Binary edge mask produced by [`canny`].
#[derive(Clone, Debug)]
pub struct EdgeMap {
    data: Vec<bool>,
    width: usize,
    height: usize,
}

impl EdgeMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    pub fn edge_count(&self) -> usize {
        self.data.iter().filter(|&&e| e).count()
    }

    /// Edge pixels as a fraction of the total area.
    pub fn density(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.edge_count() as f64 / self.data.len() as f64
    }
}

/// Canny edge detector: 3x3 Sobel, L1 gradient magnitude, non-maximum
/// suppression, double threshold with hysteresis (8-connected).
pub fn canny(plane: &Plane, lo: f32, hi: f32) -> EdgeMap {
    let (w, h) = (plane.width(), plane.height());
    if w < 3 || h < 3 {
        return EdgeMap {
            data: vec![false; w * h],
            width: w,
            height: h,
        };
    }

    let (gx, gy) = sobel_gradients(plane);
    let mut magnitude = vec![0.0f32; w * h];
    for i in 0..w * h {
        magnitude[i] = gx.data()[i].abs() + gy.data()[i].abs();
    }

    // Non-maximum suppression along the quantized gradient direction.
    let mut suppressed = vec![0.0f32; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let mag = magnitude[idx];
            if mag == 0.0 {
                continue;
            }
            let angle = gy.data()[idx].atan2(gx.data()[idx]).to_degrees();
            let angle = if angle < 0.0 { angle + 180.0 } else { angle };
            let (da, db) = if !(22.5..157.5).contains(&angle) {
                (1isize, 0isize) // horizontal gradient
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (0, 1)
            } else {
                (-1, 1)
            };
            let n1 = magnitude[(y as isize + db) as usize * w + (x as isize + da) as usize];
            let n2 = magnitude[(y as isize - db) as usize * w + (x as isize - da) as usize];
            if mag >= n1 && mag >= n2 {
                suppressed[idx] = mag;
            }
        }
    }

    // Double threshold + hysteresis from strong pixels.
    let mut state = vec![0u8; w * h]; // 0 none, 1 weak, 2 strong
    let mut stack = Vec::new();
    for (i, &mag) in suppressed.iter().enumerate() {
        if mag >= hi {
            state[i] = 2;
            stack.push(i);
        } else if mag >= lo {
            state[i] = 1;
        }
    }
    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % w, idx / w);
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let nidx = ny as usize * w + nx as usize;
                if state[nidx] == 1 {
                    state[nidx] = 2;
                    stack.push(nidx);
                }
            }
        }
    }

    EdgeMap {
        data: state.iter().map(|&s| s == 2).collect(),
        width: w,
        height: h,
    }
}

/// A `(rho, theta)` accumulator peak.
#[derive(Clone, Copy, Debug)]
pub struct HoughLine {
    pub rho: f32,
    pub theta: f32,
    pub votes: u32,
}

/// A line segment traced through edge pixels.
#[derive(Clone, Copy, Debug)]
pub struct LineSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        let dx = (self.x2 - self.x1) as f64;
        let dy = (self.y2 - self.y1) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

const THETA_BINS: usize = 180; // pi/180 resolution

struct Accumulator {
    votes: Vec<u32>,
    rho_max: isize,
    rho_bins: usize,
}

fn accumulate(edges: &EdgeMap) -> Accumulator {
    let (w, h) = (edges.width(), edges.height());
    let rho_max = ((w * w + h * h) as f64).sqrt().ceil() as isize;
    let rho_bins = (2 * rho_max + 1) as usize;
    let sin_cos: Vec<(f32, f32)> = (0..THETA_BINS)
        .map(|t| {
            let theta = t as f32 * std::f32::consts::PI / THETA_BINS as f32;
            theta.sin_cos()
        })
        .collect();

    let mut votes = vec![0u32; THETA_BINS * rho_bins];
    for y in 0..h {
        for x in 0..w {
            if !edges.is_edge(x, y) {
                continue;
            }
            for (t, &(sin, cos)) in sin_cos.iter().enumerate() {
                let rho = (x as f32 * cos + y as f32 * sin).round() as isize;
                let bin = (rho + rho_max) as usize;
                votes[t * rho_bins + bin] += 1;
            }
        }
    }
    Accumulator {
        votes,
        rho_max,
        rho_bins,
    }
}

/// Standard Hough transform. Returns accumulator peaks with at least
/// `vote_threshold` votes, strongest first (ties broken by bin order).
pub fn hough_lines(edges: &EdgeMap, vote_threshold: u32) -> Vec<HoughLine> {
    let acc = accumulate(edges);
    let mut lines = Vec::new();
    for t in 0..THETA_BINS {
        for bin in 0..acc.rho_bins {
            let votes = acc.votes[t * acc.rho_bins + bin];
            if votes >= vote_threshold {
                lines.push(HoughLine {
                    rho: (bin as isize - acc.rho_max) as f32,
                    theta: t as f32 * std::f32::consts::PI / THETA_BINS as f32,
                    votes,
                });
            }
        }
    }
    lines.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.theta.total_cmp(&b.theta)));
    lines
}

/// Extract line segments by walking each accumulator peak across the image
/// and collecting runs of edge pixels with gaps of at most `max_gap`.
/// Each edge pixel feeds at most one segment.
pub fn hough_segments(
    edges: &EdgeMap,
    vote_threshold: u32,
    min_length: f64,
    max_gap: u32,
) -> Vec<LineSegment> {
    let (w, h) = (edges.width(), edges.height());
    let lines = hough_lines(edges, vote_threshold);
    let mut consumed = vec![false; w * h];
    let mut segments = Vec::new();

    for line in lines {
        let (sin, cos) = line.theta.sin_cos();
        // Point on the line closest to the origin; direction along the line.
        let (px, py) = (line.rho * cos, line.rho * sin);
        let (dx, dy) = (-sin, cos);
        let reach = ((w * w + h * h) as f64).sqrt() as i64 + 1;

        let mut run_start: Option<(f32, f32)> = None;
        let mut run_end: (f32, f32) = (0.0, 0.0);
        let mut run_pixels: Vec<usize> = Vec::new();
        let mut gap = 0u32;

        for step in -reach..=reach {
            let fx = px + dx * step as f32;
            let fy = py + dy * step as f32;
            let x = fx.round() as isize;
            let y = fy.round() as isize;
            let inside = x >= 0 && y >= 0 && x < w as isize && y < h as isize;
            let hit = if inside {
                let idx = y as usize * w + x as usize;
                (edges.data[idx] && !consumed[idx]).then_some(idx)
            } else {
                None
            };

            if let Some(idx) = hit {
                if run_start.is_none() {
                    run_start = Some((fx, fy));
                }
                run_end = (fx, fy);
                run_pixels.push(idx);
                gap = 0;
            } else if run_start.is_some() {
                gap += 1;
                if gap > max_gap || !inside {
                    flush_run(
                        &mut run_start,
                        run_end,
                        &mut run_pixels,
                        min_length,
                        &mut consumed,
                        &mut segments,
                    );
                    gap = 0;
                }
            }
        }
        flush_run(
            &mut run_start,
            run_end,
            &mut run_pixels,
            min_length,
            &mut consumed,
            &mut segments,
        );
    }
    segments
}

fn flush_run(
    start: &mut Option<(f32, f32)>,
    end: (f32, f32),
    pixels: &mut Vec<usize>,
    min_length: f64,
    consumed: &mut [bool],
    segments: &mut Vec<LineSegment>,
) {
    if let Some((sx, sy)) = start.take() {
        let seg = LineSegment {
            x1: sx,
            y1: sy,
            x2: end.0,
            y2: end.1,
        };
        if seg.length() >= min_length {
            for &idx in pixels.iter() {
                consumed[idx] = true;
            }
            segments.push(seg);
        }
    }
    pixels.clear();
}
