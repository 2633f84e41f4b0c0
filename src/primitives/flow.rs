//! Dense optical flow between grayscale frames.
//!
//! Pyramidal block matching: 8x8 blocks, SAD cost, a half-resolution coarse
//! pass (±4 px) seeding a full-resolution refinement (±2 px), giving an
//! effective ±10 px range. Magnitudes are pixel displacements, comparable
//! in scale to dense polynomial-expansion flows; consumers treating the
//! magnitudes as thresholds keep those thresholds configurable so a
//! different flow backend can be recalibrated.

use crate::media::Plane;

const BLOCK: usize = 8;
const COARSE_RADIUS: isize = 4;
const FINE_RADIUS: isize = 2;

/// Compute dense flow from `prev` to `next`. Returns per-pixel
/// `(magnitude, angle)` planes; the angle is in radians in `[0, 2*pi)`.
pub fn dense_flow(prev: &Plane, next: &Plane) -> (Plane, Plane) {
    let (w, h) = (prev.width(), prev.height());
    debug_assert_eq!((next.width(), next.height()), (w, h));

    let use_pyramid = w >= BLOCK * 4 && h >= BLOCK * 4;
    let coarse_field = if use_pyramid {
        let prev_half = downsample(prev);
        let next_half = downsample(next);
        Some(match_blocks(&prev_half, &next_half, None, COARSE_RADIUS))
    } else {
        None
    };
    let field = match_blocks(prev, next, coarse_field.as_ref(), FINE_RADIUS);

    let mut magnitude = Plane::zeros(w, h);
    let mut angle = Plane::zeros(w, h);
    let blocks_x = block_count(w);
    for y in 0..h {
        for x in 0..w {
            let block = (y / BLOCK).min(block_count(h) - 1) * blocks_x
                + (x / BLOCK).min(blocks_x - 1);
            let (u, v) = field.vectors[block];
            magnitude.set(x, y, (u * u + v * v).sqrt());
            let mut a = v.atan2(u);
            if a < 0.0 {
                a += 2.0 * std::f32::consts::PI;
            }
            angle.set(x, y, a);
        }
    }
    (magnitude, angle)
}

struct FlowField {
    vectors: Vec<(f32, f32)>, // (u, v) per block
    blocks_x: usize,
}

fn block_count(extent: usize) -> usize {
    extent.div_ceil(BLOCK).max(1)
}

fn match_blocks(
    prev: &Plane,
    next: &Plane,
    seed: Option<&FlowField>,
    radius: isize,
) -> FlowField {
    let (w, h) = (prev.width(), prev.height());
    let blocks_x = block_count(w);
    let blocks_y = block_count(h);
    let mut vectors = Vec::with_capacity(blocks_x * blocks_y);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let (seed_u, seed_v) = match seed {
                Some(field) => {
                    let sx = (bx / 2).min(field.blocks_x - 1);
                    let sy = (by / 2).min(field.vectors.len() / field.blocks_x - 1);
                    let (u, v) = field.vectors[sy * field.blocks_x + sx];
                    ((u * 2.0).round() as isize, (v * 2.0).round() as isize)
                }
                None => (0, 0),
            };

            let x0 = (bx * BLOCK) as isize;
            let y0 = (by * BLOCK) as isize;
            let mut best = (seed_u, seed_v);
            let mut best_cost = block_sad(prev, next, x0, y0, seed_u, seed_v);
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let cand = (seed_u + dx, seed_v + dy);
                    let cost = block_sad(prev, next, x0, y0, cand.0, cand.1);
                    if cost < best_cost {
                        best_cost = cost;
                        best = cand;
                    }
                }
            }
            vectors.push((best.0 as f32, best.1 as f32));
        }
    }
    FlowField { vectors, blocks_x }
}

fn block_sad(prev: &Plane, next: &Plane, x0: isize, y0: isize, u: isize, v: isize) -> f32 {
    let mut sad = 0.0f32;
    for dy in 0..BLOCK as isize {
        for dx in 0..BLOCK as isize {
            let a = prev.at_clamped(x0 + dx, y0 + dy);
            let b = next.at_clamped(x0 + dx + u, y0 + dy + v);
            sad += (a - b).abs();
        }
    }
    sad
}

fn downsample(plane: &Plane) -> Plane {
    let w = (plane.width() / 2).max(1);
    let h = (plane.height() / 2).max(1);
    let mut out = Plane::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let sum = plane.at_clamped(2 * x as isize, 2 * y as isize)
                + plane.at_clamped(2 * x as isize + 1, 2 * y as isize)
                + plane.at_clamped(2 * x as isize, 2 * y as isize + 1)
                + plane.at_clamped(2 * x as isize + 1, 2 * y as isize + 1);
            out.set(x, y, sum / 4.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_with_square(w: usize, h: usize, sq_x: usize, sq_y: usize) -> Plane {
        let mut plane = Plane::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                plane.set(x, y, ((x * 2 + y) % 97) as f32);
            }
        }
        for y in sq_y..(sq_y + 8).min(h) {
            for x in sq_x..(sq_x + 8).min(w) {
                plane.set(x, y, 250.0);
            }
        }
        plane
    }

    #[test]
    fn static_frames_have_zero_flow() {
        let plane = gradient_with_square(64, 64, 24, 24);
        let (mag, _) = dense_flow(&plane, &plane);
        assert!(mag.data().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn translation_is_recovered_near_the_feature() {
        let a = gradient_with_square(64, 64, 24, 24);
        let b = gradient_with_square(64, 64, 27, 24); // 3 px right
        let (mag, angle) = dense_flow(&a, &b);
        // The block containing the square should report roughly 3 px of
        // rightward motion.
        let m = mag.at(27, 27);
        assert!(m >= 2.0 && m <= 5.0, "magnitude {m}");
        let a = angle.at(27, 27);
        assert!(a < 0.5 || a > 5.8, "angle {a}");
    }
}
