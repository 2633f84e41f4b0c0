//! The per-asset analysis pipeline.
//!
//! An [`Analyzer`] owns the immutable configuration and runs the probes in
//! a fixed order over one decoded asset, feeding a fresh
//! [`DecisionEngine`] per asset. Probe order is what makes the evidence
//! list deterministic, so it never varies: metadata, watermark, frequency,
//! noise, color, geometry for images; metadata, watermark, frequency,
//! temporal, motion for videos. Fast mode skips the noise, geometry and
//! motion probes.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::config::DetectorConfig;
use crate::decision::{DecisionEngine, Verdict};
use crate::media::{validate_frame_sequence, RgbFrame};
use crate::probes::{color, frequency, geometry, metadata, motion, noise, temporal, watermark};

#[derive(Clone, Debug, Serialize)]
pub struct ImageDetails {
    pub metadata: metadata::MetadataReport,
    pub watermark: watermark::WatermarkReport,
    pub frequency: frequency::FrequencyReport,
    pub color: color::ColorReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<noise::NoiseReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<geometry::GeometryReport>,
}

#[derive(Clone, Debug)]
pub struct ImageAnalysis {
    pub verdict: Verdict,
    pub details: ImageDetails,
}

#[derive(Clone, Debug, Serialize)]
pub struct VideoDetails {
    pub metadata: metadata::MetadataReport,
    pub watermark: watermark::WatermarkReport,
    pub frequency: frequency::FrequencyReport,
    pub temporal: temporal::TemporalReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<motion::MotionReport>,
}

#[derive(Clone, Debug)]
pub struct VideoAnalysis {
    pub verdict: Verdict,
    pub frames_analyzed: usize,
    pub details: VideoDetails,
}

/// Stateless analysis front end. Cheap to share behind an `Arc`; holds
/// nothing but the configuration.
pub struct Analyzer {
    cfg: DetectorConfig,
}

impl Analyzer {
    pub fn new(cfg: DetectorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Decode image bytes and run the still-image pipeline. The same bytes
    /// feed both the pixel probes and the container/metadata probe.
    pub fn analyze_image_bytes(&self, bytes: &[u8], fast_mode: bool) -> Result<ImageAnalysis> {
        let decoded = image::load_from_memory(bytes)
            .context("decode image")?
            .to_rgb8();
        let frame = RgbFrame::from_image(decoded);
        Ok(self.analyze_image(&frame, bytes, fast_mode))
    }

    /// Still-image pipeline over an already-decoded frame.
    pub fn analyze_image(
        &self,
        frame: &RgbFrame,
        container_bytes: &[u8],
        fast_mode: bool,
    ) -> ImageAnalysis {
        let cfg = &self.cfg;
        let mut engine = DecisionEngine::new(cfg);

        let metadata_report = metadata::analyze_image(container_bytes, cfg);
        for indicator in &metadata_report.indicators {
            engine.note_evidence(indicator);
        }
        engine.add_detection(
            "c2pa_synthetic",
            metadata_report.c2pa_synthetic,
            Some("C2PA metadata indicates synthetic origin"),
        );
        engine.add_detection(
            "metadata_suspicious",
            metadata_report.metadata_suspicious,
            Some("Suspicious metadata patterns"),
        );

        let watermark_report = watermark::analyze(frame, cfg);
        engine.add_detection(
            "watermark_detected",
            watermark_report.watermark_detected,
            Some(&format!(
                "Watermark detected: {}",
                watermark_report.detections.join(", ")
            )),
        );

        let frequency_report = frequency::analyze(frame, cfg);
        engine.add_detection(
            "freq_ratio_anomaly",
            frequency_report.freq_ratio_anomaly,
            Some("DCT frequency ratio anomaly"),
        );
        engine.add_detection(
            "checkboard_pattern",
            frequency_report.checkboard_pattern,
            Some("Diffusion checkerboard pattern detected"),
        );

        let noise_report = if fast_mode {
            None
        } else {
            let report = noise::analyze(frame, cfg);
            engine.add_detection(
                "noise_variance_low",
                report.noise_variance_low,
                Some("Unnaturally low noise variance"),
            );
            Some(report)
        };

        let color_report = color::analyze(frame, cfg);
        engine.add_detection(
            "rgb_correlation_high",
            color_report.rgb_correlation_high,
            Some("Abnormally high RGB channel correlation"),
        );

        let geometry_report = if fast_mode {
            None
        } else {
            let report = geometry::analyze(frame, cfg);
            engine.add_detection(
                "edge_fragmented",
                report.edge_fragmented,
                Some("Fragmented edge patterns"),
            );
            Some(report)
        };

        ImageAnalysis {
            verdict: engine.calculate_verdict(),
            details: ImageDetails {
                metadata: metadata_report,
                watermark: watermark_report,
                frequency: frequency_report,
                color: color_report,
                noise: noise_report,
                geometry: geometry_report,
            },
        }
    }

    /// Video pipeline over a sampled frame sequence plus the raw container
    /// bytes (for the metadata probe). Image-domain probes run over the
    /// first frame; temporal probes over the whole sequence.
    pub fn analyze_frames(
        &self,
        frames: &[RgbFrame],
        container_bytes: &[u8],
        fast_mode: bool,
    ) -> Result<VideoAnalysis> {
        if frames.is_empty() {
            return Err(anyhow!("Could not extract frames from video"));
        }
        validate_frame_sequence(frames)?;
        let cfg = &self.cfg;
        let mut engine = DecisionEngine::new(cfg);

        let metadata_report = metadata::analyze_video(container_bytes, cfg);
        for indicator in &metadata_report.indicators {
            engine.note_evidence(indicator);
        }
        engine.add_detection(
            "metadata_suspicious",
            metadata_report.metadata_suspicious,
            Some("Suspicious video metadata"),
        );

        let first = &frames[0];
        let watermark_report = watermark::analyze(first, cfg);
        engine.add_detection(
            "watermark_detected",
            watermark_report.watermark_detected,
            Some("Video watermark detected"),
        );

        let frequency_report = frequency::analyze(first, cfg);
        engine.add_detection(
            "checkboard_pattern",
            frequency_report.checkboard_pattern,
            Some("Diffusion artifacts in video frames"),
        );

        let temporal_report = temporal::analyze(frames, cfg);
        engine.add_detection(
            "temporal_flicker",
            temporal_report.temporal_flicker,
            Some("Diffusion flicker detected"),
        );

        let motion_report = if fast_mode {
            None
        } else {
            let report = motion::analyze(frames, cfg);
            engine.add_detection(
                "motion_vector_irregular",
                report.motion_vector_irregular,
                Some("Irregular motion vectors"),
            );
            Some(report)
        };

        Ok(VideoAnalysis {
            verdict: engine.calculate_verdict(),
            frames_analyzed: frames.len(),
            details: VideoDetails {
                metadata: metadata_report,
                watermark: watermark_report,
                frequency: frequency_report,
                temporal: temporal_report,
                motion: motion_report,
            },
        })
    }

    /// Decode a video file on disk into a sampled frame sequence and run
    /// the video pipeline. Requires the `video-ffmpeg` feature.
    pub fn analyze_video_file(
        &self,
        path: &std::path::Path,
        container_bytes: &[u8],
        fast_mode: bool,
    ) -> Result<VideoAnalysis> {
        let frames = crate::ingest::extract_frames(
            path,
            self.cfg.limits.frame_sample_rate,
            self.cfg.limits.max_frames,
        )?;
        self.analyze_frames(&frames, container_bytes, fast_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DetectionKind;

    fn analyzer() -> Analyzer {
        Analyzer::new(DetectorConfig::default())
    }

    fn textured_frame(w: u32, h: u32) -> RgbFrame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = ((x * 13 + y * 29) % 241) as u8;
                data.extend_from_slice(&[v, (v / 2) + 40, v ^ 0x35]);
            }
        }
        RgbFrame::new(data, w, h).unwrap()
    }

    #[test]
    fn image_pipeline_flags_missing_exif() {
        let frame = textured_frame(64, 64);
        let analysis = analyzer().analyze_image(&frame, b"bare pixels, no container", false);
        assert!(analysis
            .verdict
            .scores
            .contains_key(&DetectionKind::MetadataSuspicious));
        assert!(analysis
            .verdict
            .evidence
            .iter()
            .any(|e| e == metadata::NO_EXIF_INDICATOR));
        assert!(analysis
            .verdict
            .evidence
            .iter()
            .any(|e| e == "Suspicious metadata patterns"));
        assert!(analysis.details.noise.is_some());
        assert!(analysis.details.geometry.is_some());
    }

    #[test]
    fn fast_mode_skips_noise_and_geometry() {
        let frame = textured_frame(64, 64);
        let analysis = analyzer().analyze_image(&frame, b"", true);
        assert!(analysis.details.noise.is_none());
        assert!(analysis.details.geometry.is_none());
        assert!(!analysis
            .verdict
            .scores
            .contains_key(&DetectionKind::NoiseVarianceLow));
        assert!(!analysis
            .verdict
            .scores
            .contains_key(&DetectionKind::EdgeFragmented));
    }

    #[test]
    fn fast_mode_evidence_kinds_are_a_subset() {
        let frame = textured_frame(96, 96);
        let container = b"no exif here";
        let full = analyzer().analyze_image(&frame, container, false);
        let fast = analyzer().analyze_image(&frame, container, true);
        for kind in fast.verdict.scores.keys() {
            assert!(
                full.verdict.scores.contains_key(kind),
                "fast-only kind {kind:?}"
            );
        }
        assert!(fast.verdict.total_score <= full.verdict.total_score);
    }

    #[test]
    fn empty_frame_sequence_is_rejected() {
        let err = analyzer()
            .analyze_frames(&[], b"", false)
            .expect_err("empty sequence must fail");
        assert!(err.to_string().contains("Could not extract frames"));
    }

    #[test]
    fn video_pipeline_reports_frame_count_and_motion_skip() {
        let frames: Vec<RgbFrame> = (0..4).map(|_| textured_frame(48, 48)).collect();
        let full = analyzer().analyze_frames(&frames, b"", false).unwrap();
        assert_eq!(full.frames_analyzed, 4);
        assert!(full.details.motion.is_some());

        let fast = analyzer().analyze_frames(&frames, b"", true).unwrap();
        assert!(fast.details.motion.is_none());
        assert!(!fast
            .verdict
            .scores
            .contains_key(&DetectionKind::MotionVectorIrregular));
    }

    #[test]
    fn decode_failure_is_an_error() {
        assert!(analyzer()
            .analyze_image_bytes(b"not an image", false)
            .is_err());
    }
}
