//! Watermark probe: corner edge density, frequency-domain autocorrelation
//! peak, and LSB chi-square.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::media::RgbFrame;
use crate::primitives::edges::canny;
use crate::primitives::spectral::{autocorr_2d, dct_2d};
use crate::primitives::to_gray;

const CANNY_LO: f32 = 50.0;
const CANNY_HI: f32 = 150.0;
const CORNER_NAMES: [&str; 4] = ["top-left", "top-right", "bottom-left", "bottom-right"];

#[derive(Clone, Debug, Default, Serialize)]
pub struct CornerScan {
    pub detected: bool,
    pub location: Option<String>,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct FrequencyScan {
    pub detected: bool,
    pub peak_strength: f64,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LsbScan {
    pub detected: bool,
    pub chi_square: f64,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct WatermarkDetails {
    pub text_watermark: CornerScan,
    pub frequency_watermark: FrequencyScan,
    pub lsb_steganography: LsbScan,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct WatermarkReport {
    pub watermark_detected: bool,
    pub confidence: f64,
    pub detections: Vec<String>,
    pub details: WatermarkDetails,
}

pub fn analyze(frame: &RgbFrame, cfg: &DetectorConfig) -> WatermarkReport {
    let gray = to_gray(frame);
    let mut detections = Vec::new();

    let text = scan_corners(&gray, cfg, &mut detections);
    let frequency = scan_frequency_domain(&gray, cfg, &mut detections);
    let lsb = scan_lsb_plane(frame, cfg, &mut detections);

    let watermark_detected = text.detected || frequency.detected || lsb.detected;
    let confidence = text
        .confidence
        .max(frequency.confidence)
        .max(lsb.confidence);

    WatermarkReport {
        watermark_detected,
        confidence,
        detections,
        details: WatermarkDetails {
            text_watermark: text,
            frequency_watermark: frequency,
            lsb_steganography: lsb,
        },
    }
}

/// Visible overlay heuristic: Canny density in the four `H/10 x W/10`
/// corner crops. Reports the first corner past the density threshold.
fn scan_corners(
    gray: &crate::media::Plane,
    cfg: &DetectorConfig,
    detections: &mut Vec<String>,
) -> CornerScan {
    let (w, h) = (gray.width(), gray.height());
    let (cw, ch) = (w / 10, h / 10);
    if cw == 0 || ch == 0 {
        return CornerScan::default();
    }
    let corners = [
        gray.crop(0, 0, cw, ch),
        gray.crop(w - cw, 0, cw, ch),
        gray.crop(0, h - ch, cw, ch),
        gray.crop(w - cw, h - ch, cw, ch),
    ];
    for (corner, name) in corners.iter().zip(CORNER_NAMES) {
        let density = canny(corner, CANNY_LO, CANNY_HI).density();
        if density > cfg.thresholds.corner_edge_density {
            detections.push(format!("Corner watermark at {name}"));
            return CornerScan {
                detected: true,
                location: Some(name.to_string()),
                confidence: 0.6,
            };
        }
    }
    CornerScan::default()
}

/// Periodic pattern embedded in the high-frequency DCT quadrant: take its
/// 2-D autocorrelation, zero a 10x10 block around the center, and threshold
/// the strongest remaining peak.
fn scan_frequency_domain(
    gray: &crate::media::Plane,
    cfg: &DetectorConfig,
    detections: &mut Vec<String>,
) -> FrequencyScan {
    let (w, h) = (gray.width(), gray.height());
    if w < 4 || h < 4 {
        return FrequencyScan::default();
    }
    let dct = dct_2d(gray);
    let high = dct.crop(w / 2, h / 2, w - w / 2, h - h / 2);
    let mut autocorr = autocorr_2d(&high);

    let (aw, ah) = (autocorr.width(), autocorr.height());
    let (cx, cy) = (aw / 2, ah / 2);
    for y in cy.saturating_sub(5)..(cy + 5).min(ah) {
        for x in cx.saturating_sub(5)..(cx + 5).min(aw) {
            autocorr.set(x, y, 0.0);
        }
    }
    let peak = autocorr.max_value().max(0.0) as f64;
    let detected = peak > cfg.thresholds.freq_watermark_peak;
    if detected {
        detections.push("Frequency domain watermark pattern".to_string());
    }
    FrequencyScan {
        detected,
        peak_strength: peak,
        confidence: if detected { peak.min(1.0) } else { 0.0 },
    }
}

/// Chi-square of the least-significant-bit plane against a fair coin.
fn scan_lsb_plane(
    frame: &RgbFrame,
    cfg: &DetectorConfig,
    detections: &mut Vec<String>,
) -> LsbScan {
    let total = frame.data().len() as f64;
    if total == 0.0 {
        return LsbScan::default();
    }
    let ones = frame.data().iter().filter(|&&b| b & 1 == 1).count() as f64;
    let zeros = total - ones;
    let expected = total / 2.0;
    let chi_square = ((zeros - expected).powi(2) + (ones - expected).powi(2)) / expected;

    let detected = chi_square > cfg.thresholds.lsb_chi_square;
    if detected {
        detections.push("LSB steganography anomaly".to_string());
    }
    LsbScan {
        detected,
        chi_square,
        confidence: if detected {
            (chi_square / 10.0).min(1.0)
        } else {
            0.0
        },
    }
}
