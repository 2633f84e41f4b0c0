//! Color probe: cross-channel correlation, histogram mode spread, and
//! saturation extremes.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::media::RgbFrame;
use crate::primitives::saturation_plane;
use crate::stats;

#[derive(Clone, Debug, Default, Serialize)]
pub struct CorrelationScan {
    pub avg_correlation: f64,
    pub r_g: f64,
    pub r_b: f64,
    pub g_b: f64,
    pub is_high: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ModeSpreadScan {
    pub mode_std: f64,
    pub is_unnatural: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SaturationScan {
    pub mean_saturation: f64,
    pub std_saturation: f64,
    pub is_extreme: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ColorDetails {
    pub rgb_correlation: CorrelationScan,
    pub color_cast: ModeSpreadScan,
    pub saturation: SaturationScan,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ColorReport {
    pub rgb_correlation_high: bool,
    pub details: ColorDetails,
}

pub fn analyze(frame: &RgbFrame, cfg: &DetectorConfig) -> ColorReport {
    let r = frame.channel_plane(0);
    let g = frame.channel_plane(1);
    let b = frame.channel_plane(2);

    let rgb_correlation = scan_correlation(r.data(), g.data(), b.data(), cfg);
    let color_cast = scan_mode_spread(r.data(), g.data(), b.data(), cfg);
    let saturation = scan_saturation(frame, cfg);

    ColorReport {
        rgb_correlation_high: rgb_correlation.is_high,
        details: ColorDetails {
            rgb_correlation,
            color_cast,
            saturation,
        },
    }
}

/// Mean pairwise Pearson correlation of the flattened channels.
fn scan_correlation(r: &[f32], g: &[f32], b: &[f32], cfg: &DetectorConfig) -> CorrelationScan {
    let r_g = stats::pearson(r, g);
    let r_b = stats::pearson(r, b);
    let g_b = stats::pearson(g, b);
    let avg_correlation = (r_g + r_b + g_b) / 3.0;

    let is_high = avg_correlation > cfg.thresholds.rgb_correlation_ai_min;
    CorrelationScan {
        avg_correlation,
        r_g,
        r_b,
        g_b,
        is_high,
        confidence: if is_high { 0.6 } else { 0.0 },
    }
}

/// Spread of the per-channel histogram modes. Near-identical modes across
/// all three channels read as an unnatural global cast.
fn scan_mode_spread(r: &[f32], g: &[f32], b: &[f32], cfg: &DetectorConfig) -> ModeSpreadScan {
    fn mode(channel: &[f32]) -> f32 {
        let hist = stats::histogram(channel, 256, 0.0, 256.0);
        let mut best = 0usize;
        for (i, &count) in hist.iter().enumerate() {
            if count > hist[best] {
                best = i;
            }
        }
        best as f32
    }
    let modes = [mode(r), mode(g), mode(b)];
    let mode_std = stats::std_dev(&modes);

    let is_unnatural = mode_std < cfg.thresholds.mode_spread_min;
    ModeSpreadScan {
        mode_std,
        is_unnatural,
        confidence: if is_unnatural { 0.4 } else { 0.0 },
    }
}

fn scan_saturation(frame: &RgbFrame, cfg: &DetectorConfig) -> SaturationScan {
    let saturation = saturation_plane(frame);
    let mean_saturation = stats::mean(saturation.data());
    let std_saturation = stats::std_dev(saturation.data());

    let is_extreme = mean_saturation > cfg.thresholds.saturation_high
        || mean_saturation < cfg.thresholds.saturation_low;
    SaturationScan {
        mean_saturation,
        std_saturation,
        is_extreme,
        confidence: if is_extreme { 0.3 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DetectorConfig {
        DetectorConfig::default()
    }

    fn frame_from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> RgbFrame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&f(x, y));
            }
        }
        RgbFrame::new(data, w, h).unwrap()
    }

    #[test]
    fn monochrome_texture_correlates_perfectly() {
        // Identical channels vary together pixel to pixel.
        let frame = frame_from_fn(32, 32, |x, y| {
            let v = ((x * 7 + y * 13) % 200) as u8;
            [v, v, v]
        });
        let report = analyze(&frame, &cfg());
        let corr = &report.details.rgb_correlation;
        assert!(report.rgb_correlation_high);
        assert!((corr.avg_correlation - 1.0).abs() < 1e-9);
        // Gray pixels carry zero saturation.
        assert!(report.details.saturation.is_extreme);
        assert!(report.details.saturation.mean_saturation < 30.0);
    }

    #[test]
    fn independent_channels_stay_uncorrelated() {
        let frame = frame_from_fn(32, 32, |x, y| {
            let i = x + y * 32;
            [
                (i.wrapping_mul(2654435761) >> 24) as u8,
                (i.wrapping_mul(2246822519) >> 24) as u8,
                (i.wrapping_mul(3266489917) >> 24) as u8,
            ]
        });
        let report = analyze(&frame, &cfg());
        assert!(!report.rgb_correlation_high);
        assert!(report.details.rgb_correlation.avg_correlation < 0.95);
    }

    #[test]
    fn separated_channel_modes_spread_out() {
        // Dominant values 20/120/220 per channel.
        let frame = frame_from_fn(32, 32, |x, _| {
            if x % 5 == 0 {
                [0, 0, 0]
            } else {
                [20, 120, 220]
            }
        });
        let report = analyze(&frame, &cfg());
        let cast = &report.details.color_cast;
        assert!(!cast.is_unnatural);
        assert!(cast.mode_std > 10.0);
    }

    #[test]
    fn flat_frame_correlation_is_degenerate_zero() {
        let frame = frame_from_fn(16, 16, |_, _| [90, 90, 90]);
        let report = analyze(&frame, &cfg());
        assert!(!report.rgb_correlation_high);
        assert_eq!(report.details.rgb_correlation.avg_correlation, 0.0);
        assert!(report.details.color_cast.is_unnatural);
    }
}
