//! Frequency-domain primitives: 2-D DCT-II, FFT magnitude, and
//! FFT-based 2-D autocorrelation.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::media::Plane;

/// 2-D DCT-II of a grayscale plane, input normalized to `[0, 1]` first.
/// Orthonormal scaling, applied separably with precomputed cosine tables.
pub fn dct_2d(gray: &Plane) -> Plane {
    let (w, h) = (gray.width(), gray.height());
    let normalized: Vec<f32> = gray.data().iter().map(|&v| v / 255.0).collect();
    let row_table = dct_table(w);
    let col_table = dct_table(h);

    // Rows.
    let mut rows = vec![0.0f32; w * h];
    for y in 0..h {
        let input = &normalized[y * w..(y + 1) * w];
        let out = &mut rows[y * w..(y + 1) * w];
        dct_1d(input, &row_table, w, out);
    }

    // Columns.
    let mut out = Plane::zeros(w, h);
    let mut column = vec![0.0f32; h];
    let mut transformed = vec![0.0f32; h];
    for x in 0..w {
        for y in 0..h {
            column[y] = rows[y * w + x];
        }
        dct_1d(&column, &col_table, h, &mut transformed);
        for y in 0..h {
            out.set(x, y, transformed[y]);
        }
    }
    out
}

fn dct_table(n: usize) -> Vec<f32> {
    let mut table = vec![0.0f32; n * n];
    let norm0 = (1.0 / n as f64).sqrt();
    let norm = (2.0 / n as f64).sqrt();
    for k in 0..n {
        let scale = if k == 0 { norm0 } else { norm };
        for i in 0..n {
            let angle = std::f64::consts::PI * (2.0 * i as f64 + 1.0) * k as f64 / (2.0 * n as f64);
            table[k * n + i] = (scale * angle.cos()) as f32;
        }
    }
    table
}

fn dct_1d(input: &[f32], table: &[f32], n: usize, out: &mut [f32]) {
    for k in 0..n {
        let row = &table[k * n..(k + 1) * n];
        out[k] = input.iter().zip(row.iter()).map(|(&x, &c)| x * c).sum();
    }
}

/// Magnitude of the centered 2-D FFT of a grayscale plane.
pub fn fft_mag(gray: &Plane) -> Plane {
    let (w, h) = (gray.width(), gray.height());
    let spectrum = fft_2d(gray.data(), w, h, false);
    let magnitudes: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();
    fftshift(&Plane::from_vec(magnitudes, w, h))
}

/// 2-D autocorrelation via the power spectrum: `IFFT(|FFT(x)|^2)`, centered
/// with the peak normalized to 1. The peak sits at `(w/2, h/2)`.
pub fn autocorr_2d(plane: &Plane) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    if w == 0 || h == 0 {
        return Plane::zeros(w, h);
    }
    let spectrum = fft_2d(plane.data(), w, h, false);
    let power: Vec<Complex<f32>> = spectrum
        .iter()
        .map(|c| Complex::new(c.norm_sqr(), 0.0))
        .collect();
    let correlated = fft_2d_complex(power, w, h, true);
    let real: Vec<f32> = correlated.iter().map(|c| c.re).collect();
    let shifted = fftshift(&Plane::from_vec(real, w, h));
    let peak = shifted.max_value();
    if peak <= 0.0 {
        return Plane::zeros(w, h);
    }
    let normalized = shifted.data().iter().map(|&v| v / peak).collect();
    Plane::from_vec(normalized, w, h)
}

/// Magnitudes of the 1-D DFT of a real series (all bins).
pub fn dft_magnitudes(series: &[f32]) -> Vec<f32> {
    if series.is_empty() {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(series.len());
    let mut buf: Vec<Complex<f32>> = series.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut buf);
    buf.iter().map(|c| c.norm()).collect()
}

fn fft_2d(data: &[f32], w: usize, h: usize, inverse: bool) -> Vec<Complex<f32>> {
    let buf: Vec<Complex<f32>> = data.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft_2d_complex(buf, w, h, inverse)
}

fn fft_2d_complex(mut buf: Vec<Complex<f32>>, w: usize, h: usize, inverse: bool) -> Vec<Complex<f32>> {
    let mut planner = FftPlanner::<f32>::new();
    let row_fft = if inverse {
        planner.plan_fft_inverse(w)
    } else {
        planner.plan_fft_forward(w)
    };
    let col_fft = if inverse {
        planner.plan_fft_inverse(h)
    } else {
        planner.plan_fft_forward(h)
    };

    for y in 0..h {
        row_fft.process(&mut buf[y * w..(y + 1) * w]);
    }

    let mut column = vec![Complex::new(0.0f32, 0.0); h];
    for x in 0..w {
        for y in 0..h {
            column[y] = buf[y * w + x];
        }
        col_fft.process(&mut column);
        for y in 0..h {
            buf[y * w + x] = column[y];
        }
    }

    if inverse {
        let scale = 1.0 / (w * h) as f32;
        for v in &mut buf {
            *v *= scale;
        }
    }
    buf
}

/// Move the zero-frequency component to `(w/2, h/2)`.
fn fftshift(plane: &Plane) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    let (sx, sy) = (w / 2, h / 2);
    let mut out = Plane::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set((x + sx) % w, (y + sy) % h, plane.at(x, y));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dct_of_constant_concentrates_in_dc() {
        let plane = Plane::from_vec(vec![255.0; 64], 8, 8);
        let dct = dct_2d(&plane);
        // DC = N * mean for an orthonormal 2-D DCT of an 8x8 ones matrix.
        assert!((dct.at(0, 0) - 8.0).abs() < 1e-3);
        for y in 0..8 {
            for x in 0..8 {
                if x != 0 || y != 0 {
                    assert!(dct.at(x, y).abs() < 1e-4, "AC leak at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn autocorr_peak_is_centered_and_one() {
        let data: Vec<f32> = (0..256).map(|i| ((i * 37) % 251) as f32).collect();
        let plane = Plane::from_vec(data, 16, 16);
        let ac = autocorr_2d(&plane);
        assert!((ac.at(8, 8) - 1.0).abs() < 1e-4);
        for y in 0..16 {
            for x in 0..16 {
                assert!(ac.at(x, y) <= 1.0 + 1e-4);
            }
        }
    }

    #[test]
    fn autocorr_of_period_8_stripes_peaks_at_offset_8() {
        // Vertical stripes with an 8 px period put a strong secondary peak
        // 8 columns from the center.
        let w = 64;
        let h = 64;
        let mut data = vec![0.0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                if (x / 4) % 2 == 0 {
                    data[y * w + x] = 200.0;
                }
            }
        }
        let ac = autocorr_2d(&Plane::from_vec(data, w, h));
        let center = (w / 2, h / 2);
        let side = ac.at(center.0 + 8, center.1);
        assert!(side > 0.5, "expected periodic peak, got {side}");
    }

    #[test]
    fn fft_mag_centers_dc() {
        let plane = Plane::from_vec(vec![1.0; 64], 8, 8);
        let mag = fft_mag(&plane);
        // All energy in the DC bin, which fftshift moves to the center.
        assert!((mag.at(4, 4) - 64.0).abs() < 1e-3);
        assert!(mag.at(0, 0).abs() < 1e-3);
    }

    #[test]
    fn dft_magnitudes_pick_out_a_tone() {
        let n = 32;
        let series: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 4.0 * i as f32 / n as f32).sin())
            .collect();
        let mags = dft_magnitudes(&series);
        let peak_bin = (1..n / 2).max_by(|&a, &b| mags[a].total_cmp(&mags[b])).unwrap();
        assert_eq!(peak_bin, 4);
    }
}
