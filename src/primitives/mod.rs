//! Image signal primitives.
//!
//! Pure functions over [`RgbFrame`]/[`Plane`]; no shared state. Every probe
//! is built from these, so they are deliberately deterministic: the same
//! input produces the same output bit for bit on a given platform.

pub mod edges;
pub mod flow;
pub mod spectral;

use crate::media::{Plane, RgbFrame};

/// Standard luma conversion (ITU-R BT.601 coefficients), values in 0..255.
pub fn to_gray(frame: &RgbFrame) -> Plane {
    let data = frame
        .data()
        .chunks_exact(3)
        .map(|px| 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32)
        .collect();
    Plane::from_vec(data, frame.width() as usize, frame.height() as usize)
}

/// Gaussian kernel of odd size `k`. Sigma follows the usual derivation from
/// the kernel size: `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
fn gaussian_kernel(k: usize) -> Vec<f32> {
    let k = if k % 2 == 0 { k + 1 } else { k.max(1) };
    let sigma = 0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (k / 2) as isize;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-(i as f32 * i as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur with kernel size `k` (default callers use 5).
/// Borders replicate the edge sample.
pub fn gaussian_blur(plane: &Plane, k: usize) -> Plane {
    let kernel = gaussian_kernel(k);
    let half = (kernel.len() / 2) as isize;
    let (w, h) = (plane.width(), plane.height());

    // Horizontal pass.
    let mut tmp = Plane::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (i, &kv) in kernel.iter().enumerate() {
                acc += kv * plane.at_clamped(x as isize + i as isize - half, y as isize);
            }
            tmp.set(x, y, acc);
        }
    }

    // Vertical pass.
    let mut out = Plane::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (i, &kv) in kernel.iter().enumerate() {
                acc += kv * tmp.at_clamped(x as isize, y as isize + i as isize - half);
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Per-channel noise residual: `I - gaussian_blur(I, 5)`, concatenated
/// R-plane, G-plane, B-plane, in float.
pub fn noise_residual(frame: &RgbFrame) -> Vec<f32> {
    let mut residual = Vec::with_capacity(frame.pixel_count() * 3);
    for channel in 0..3 {
        let plane = frame.channel_plane(channel);
        let blurred = gaussian_blur(&plane, 5);
        residual.extend(
            plane
                .data()
                .iter()
                .zip(blurred.data().iter())
                .map(|(&orig, &blur)| orig - blur),
        );
    }
    residual
}

/// 3x3 Sobel gradients `(gx, gy)` with replicated borders.
pub fn sobel_gradients(plane: &Plane) -> (Plane, Plane) {
    let (w, h) = (plane.width(), plane.height());
    let mut gx = Plane::zeros(w, h);
    let mut gy = Plane::zeros(w, h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let p = |dx: isize, dy: isize| plane.at_clamped(x + dx, y + dy);
            let sx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let sy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            gx.set(x as usize, y as usize, sx);
            gy.set(x as usize, y as usize, sy);
        }
    }
    (gx, gy)
}

/// HSV saturation channel in 0..255 (8-bit convention: `255 * (max-min)/max`,
/// zero for black pixels).
pub fn saturation_plane(frame: &RgbFrame) -> Plane {
    let data = frame
        .data()
        .chunks_exact(3)
        .map(|px| {
            let max = px[0].max(px[1]).max(px[2]) as f32;
            let min = px[0].min(px[1]).min(px[2]) as f32;
            if max == 0.0 {
                0.0
            } else {
                255.0 * (max - min) / max
            }
        })
        .collect();
    Plane::from_vec(data, frame.width() as usize, frame.height() as usize)
}
