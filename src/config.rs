//! Detector configuration.
//!
//! A single immutable [`DetectorConfig`] is built at startup and shared
//! read-only by every analysis: score weights, verdict cutoffs, probe
//! thresholds, signature string lists, and media limits. `load()` reads an
//! optional TOML/JSON config file (`SYNTHSCAN_CONFIG`), applies
//! `SYNTHSCAN_*` environment overrides, then validates.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::decision::DetectionKind;

const DEFAULT_API_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;
const DEFAULT_MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;
const DEFAULT_FRAME_SAMPLE_RATE: u32 = 10;
const DEFAULT_MAX_FRAMES: u32 = 100;
const DEFAULT_MAX_BATCH_FILES: usize = 10;

pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

const DEFAULT_AI_SOFTWARE_TAGS: [&str; 8] = [
    "midjourney",
    "dall-e",
    "stable diffusion",
    "adobe firefly",
    "runway",
    "pika labs",
    "synthesia",
    "d-id",
];

const DEFAULT_AI_WATERMARK_STRINGS: [&str; 14] = [
    "midjourney",
    "dall-e",
    "dall\u{b7}e",
    "openai",
    "runway",
    "stable diffusion",
    "adobe firefly",
    "pika",
    "sora",
    "kling",
    "synthetic",
    "ai generated",
    "content credentials",
    "c2pa",
];

const DEFAULT_SYNTHETIC_ENCODERS: [&str; 4] = ["runway", "pika", "sora", "synthesia"];

const DEFAULT_CAMERA_FIELDS: [&str; 5] =
    ["Make", "Model", "LensModel", "FocalLength", "ISOSpeedRatings"];

/// Per-kind evidence weights. Keys are canonical detection kind names.
#[derive(Debug, Clone)]
pub struct ScoreWeights(BTreeMap<String, u32>);

impl Default for ScoreWeights {
    fn default() -> Self {
        Self(
            DetectionKind::ALL
                .iter()
                .map(|kind| (kind.name().to_string(), kind.default_weight()))
                .collect(),
        )
    }
}

impl ScoreWeights {
    pub fn weight_of(&self, kind: &str) -> Option<u32> {
        self.0.get(kind).copied()
    }

    /// Sum of every configured weight; the confidence denominator.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn set(&mut self, kind: &str, weight: u32) {
        self.0.insert(kind.to_string(), weight);
    }
}

/// Which cutoff table drives the verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictMode {
    /// Confidence thresholds 0.70 / 0.50 / 0.30. Canonical.
    Confidence,
    /// Raw-score thresholds, kept as an alternative labeling mode.
    Score,
}

impl VerdictMode {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "confidence" => Ok(Self::Confidence),
            "score" => Ok(Self::Score),
            other => Err(anyhow!(
                "unsupported verdict mode '{}'; expected 'confidence' or 'score'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerdictCutoffs {
    pub mode: VerdictMode,
    pub ai_generated: f64,
    pub likely_ai: f64,
    pub suspicious: f64,
    pub score_high: u32,
    pub score_medium: u32,
    pub score_suspicious: u32,
}

impl Default for VerdictCutoffs {
    fn default() -> Self {
        Self {
            mode: VerdictMode::Confidence,
            ai_generated: 0.70,
            likely_ai: 0.50,
            suspicious: 0.30,
            score_high: 100,
            score_medium: 60,
            score_suspicious: 30,
        }
    }
}

/// Probe decision thresholds. Defaults adopt the stricter current set;
/// the looser historical values (checkerboard 0.15, dct ratio 0.22,
/// edge continuity 0.6) are plain overrides away.
#[derive(Debug, Clone)]
pub struct AnalysisThresholds {
    pub dct_freq_ratio_ai_max: f64,
    pub checkerboard_peak: f64,
    pub gan_grid_strength: f64,
    pub noise_variance_ai_max: f64,
    pub noise_entropy_min: f64,
    pub noise_homogeneity_min: f64,
    pub pixel_chi_square_min: f64,
    pub rgb_correlation_ai_min: f64,
    pub mode_spread_min: f64,
    pub saturation_low: f64,
    pub saturation_high: f64,
    pub edge_continuity_ai_max: f64,
    pub symmetry_max: f64,
    pub perspective_angle_std_max: f64,
    pub corner_edge_density: f64,
    pub freq_watermark_peak: f64,
    pub lsb_chi_square: f64,
    pub temporal_noise_min: f64,
    pub temporal_noise_max: f64,
    pub frame_correlation_min: f64,
    pub frame_correlation_max: f64,
    pub flicker_peak_ratio: f64,
    pub motion_variance_min: f64,
    pub motion_variance_max: f64,
    pub motion_smoothness_min: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            dct_freq_ratio_ai_max: 0.10,
            checkerboard_peak: 0.25,
            gan_grid_strength: 15.0,
            noise_variance_ai_max: 5.0,
            noise_entropy_min: 4.0,
            noise_homogeneity_min: 50.0,
            pixel_chi_square_min: 0.5,
            rgb_correlation_ai_min: 0.95,
            mode_spread_min: 10.0,
            saturation_low: 30.0,
            saturation_high: 200.0,
            edge_continuity_ai_max: 0.4,
            symmetry_max: 0.85,
            perspective_angle_std_max: 1.0,
            corner_edge_density: 0.05,
            freq_watermark_peak: 0.3,
            lsb_chi_square: 3.84,
            temporal_noise_min: 2.5,
            temporal_noise_max: 10.0,
            frame_correlation_min: 0.5,
            frame_correlation_max: 0.98,
            flicker_peak_ratio: 3.0,
            motion_variance_min: 0.5,
            motion_variance_max: 50.0,
            motion_smoothness_min: 0.1,
        }
    }
}

/// Known-synthetic signature strings scanned by the metadata probe.
#[derive(Debug, Clone)]
pub struct SignatureStrings {
    pub ai_software_tags: Vec<String>,
    pub ai_watermark_strings: Vec<String>,
    pub synthetic_encoders: Vec<String>,
    pub camera_fields: Vec<String>,
}

impl Default for SignatureStrings {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            ai_software_tags: owned(&DEFAULT_AI_SOFTWARE_TAGS),
            ai_watermark_strings: owned(&DEFAULT_AI_WATERMARK_STRINGS),
            synthetic_encoders: owned(&DEFAULT_SYNTHETIC_ENCODERS),
            camera_fields: owned(&DEFAULT_CAMERA_FIELDS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaLimits {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    pub frame_sample_rate: u32,
    pub max_frames: u32,
    pub max_batch_files: usize,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            frame_sample_rate: DEFAULT_FRAME_SAMPLE_RATE,
            max_frames: DEFAULT_MAX_FRAMES,
            max_batch_files: DEFAULT_MAX_BATCH_FILES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub addr: String,
    pub static_dir: PathBuf,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_API_ADDR.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

/// Process-wide immutable detector configuration.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    pub weights: ScoreWeights,
    pub cutoffs: VerdictCutoffs,
    pub thresholds: AnalysisThresholds,
    pub strings: SignatureStrings,
    pub limits: MediaLimits,
    pub api: ApiSettings,
}

// ---------------- config file shapes ----------------

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    weights: Option<BTreeMap<String, u32>>,
    verdict: Option<VerdictConfigFile>,
    thresholds: Option<ThresholdsConfigFile>,
    strings: Option<StringsConfigFile>,
    limits: Option<LimitsConfigFile>,
    api: Option<ApiConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct VerdictConfigFile {
    mode: Option<String>,
    ai_generated: Option<f64>,
    likely_ai: Option<f64>,
    suspicious: Option<f64>,
    score_high: Option<u32>,
    score_medium: Option<u32>,
    score_suspicious: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdsConfigFile {
    dct_freq_ratio_ai_max: Option<f64>,
    checkerboard_peak: Option<f64>,
    gan_grid_strength: Option<f64>,
    noise_variance_ai_max: Option<f64>,
    noise_entropy_min: Option<f64>,
    noise_homogeneity_min: Option<f64>,
    pixel_chi_square_min: Option<f64>,
    rgb_correlation_ai_min: Option<f64>,
    mode_spread_min: Option<f64>,
    saturation_low: Option<f64>,
    saturation_high: Option<f64>,
    edge_continuity_ai_max: Option<f64>,
    symmetry_max: Option<f64>,
    perspective_angle_std_max: Option<f64>,
    corner_edge_density: Option<f64>,
    freq_watermark_peak: Option<f64>,
    lsb_chi_square: Option<f64>,
    temporal_noise_min: Option<f64>,
    temporal_noise_max: Option<f64>,
    frame_correlation_min: Option<f64>,
    frame_correlation_max: Option<f64>,
    flicker_peak_ratio: Option<f64>,
    motion_variance_min: Option<f64>,
    motion_variance_max: Option<f64>,
    motion_smoothness_min: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct StringsConfigFile {
    ai_software_tags: Option<Vec<String>>,
    ai_watermark_strings: Option<Vec<String>>,
    synthetic_encoders: Option<Vec<String>>,
    camera_fields: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct LimitsConfigFile {
    max_image_bytes: Option<u64>,
    max_video_bytes: Option<u64>,
    frame_sample_rate: Option<u32>,
    max_frames: Option<u32>,
    max_batch_files: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
    static_dir: Option<PathBuf>,
}

impl DetectorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SYNTHSCAN_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectorConfigFile) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(weights) = file.weights {
            for (kind, weight) in weights {
                if DetectionKind::parse(&kind).is_none() {
                    return Err(anyhow!("unknown detection kind '{}' in weights", kind));
                }
                cfg.weights.set(&kind, weight);
            }
        }

        if let Some(verdict) = file.verdict {
            if let Some(mode) = verdict.mode {
                cfg.cutoffs.mode = VerdictMode::parse(&mode)?;
            }
            if let Some(v) = verdict.ai_generated {
                cfg.cutoffs.ai_generated = v;
            }
            if let Some(v) = verdict.likely_ai {
                cfg.cutoffs.likely_ai = v;
            }
            if let Some(v) = verdict.suspicious {
                cfg.cutoffs.suspicious = v;
            }
            if let Some(v) = verdict.score_high {
                cfg.cutoffs.score_high = v;
            }
            if let Some(v) = verdict.score_medium {
                cfg.cutoffs.score_medium = v;
            }
            if let Some(v) = verdict.score_suspicious {
                cfg.cutoffs.score_suspicious = v;
            }
        }

        if let Some(thresholds) = file.thresholds {
            macro_rules! take {
                ($($field:ident),+ $(,)?) => {
                    $(if let Some(value) = thresholds.$field {
                        cfg.thresholds.$field = value;
                    })+
                };
            }
            take!(
                dct_freq_ratio_ai_max,
                checkerboard_peak,
                gan_grid_strength,
                noise_variance_ai_max,
                noise_entropy_min,
                noise_homogeneity_min,
                pixel_chi_square_min,
                rgb_correlation_ai_min,
                mode_spread_min,
                saturation_low,
                saturation_high,
                edge_continuity_ai_max,
                symmetry_max,
                perspective_angle_std_max,
                corner_edge_density,
                freq_watermark_peak,
                lsb_chi_square,
                temporal_noise_min,
                temporal_noise_max,
                frame_correlation_min,
                frame_correlation_max,
                flicker_peak_ratio,
                motion_variance_min,
                motion_variance_max,
                motion_smoothness_min,
            );
        }

        if let Some(strings) = file.strings {
            if let Some(tags) = strings.ai_software_tags {
                cfg.strings.ai_software_tags = lowercased(tags);
            }
            if let Some(marks) = strings.ai_watermark_strings {
                cfg.strings.ai_watermark_strings = lowercased(marks);
            }
            if let Some(encoders) = strings.synthetic_encoders {
                cfg.strings.synthetic_encoders = lowercased(encoders);
            }
            if let Some(fields) = strings.camera_fields {
                cfg.strings.camera_fields = fields;
            }
        }

        if let Some(limits) = file.limits {
            if let Some(v) = limits.max_image_bytes {
                cfg.limits.max_image_bytes = v;
            }
            if let Some(v) = limits.max_video_bytes {
                cfg.limits.max_video_bytes = v;
            }
            if let Some(v) = limits.frame_sample_rate {
                cfg.limits.frame_sample_rate = v;
            }
            if let Some(v) = limits.max_frames {
                cfg.limits.max_frames = v;
            }
            if let Some(v) = limits.max_batch_files {
                cfg.limits.max_batch_files = v;
            }
        }

        if let Some(api) = file.api {
            if let Some(addr) = api.addr {
                cfg.api.addr = addr;
            }
            if let Some(dir) = api.static_dir {
                cfg.api.static_dir = dir;
            }
        }

        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("SYNTHSCAN_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api.addr = addr;
            }
        }
        if let Ok(dir) = std::env::var("SYNTHSCAN_STATIC_DIR") {
            if !dir.trim().is_empty() {
                self.api.static_dir = PathBuf::from(dir);
            }
        }
        if let Ok(mode) = std::env::var("SYNTHSCAN_VERDICT_MODE") {
            if !mode.trim().is_empty() {
                self.cutoffs.mode = VerdictMode::parse(&mode)?;
            }
        }
        if let Ok(rate) = std::env::var("SYNTHSCAN_FRAME_SAMPLE_RATE") {
            if !rate.trim().is_empty() {
                self.limits.frame_sample_rate = rate
                    .parse()
                    .map_err(|_| anyhow!("SYNTHSCAN_FRAME_SAMPLE_RATE must be an integer"))?;
            }
        }
        if let Ok(frames) = std::env::var("SYNTHSCAN_MAX_FRAMES") {
            if !frames.trim().is_empty() {
                self.limits.max_frames = frames
                    .parse()
                    .map_err(|_| anyhow!("SYNTHSCAN_MAX_FRAMES must be an integer"))?;
            }
        }
        if let Ok(bytes) = std::env::var("SYNTHSCAN_MAX_IMAGE_BYTES") {
            if !bytes.trim().is_empty() {
                self.limits.max_image_bytes = bytes
                    .parse()
                    .map_err(|_| anyhow!("SYNTHSCAN_MAX_IMAGE_BYTES must be an integer"))?;
            }
        }
        if let Ok(bytes) = std::env::var("SYNTHSCAN_MAX_VIDEO_BYTES") {
            if !bytes.trim().is_empty() {
                self.limits.max_video_bytes = bytes
                    .parse()
                    .map_err(|_| anyhow!("SYNTHSCAN_MAX_VIDEO_BYTES must be an integer"))?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.weights.total() == 0 {
            return Err(anyhow!("score weights must not all be zero"));
        }
        let c = &self.cutoffs;
        if !(c.suspicious < c.likely_ai && c.likely_ai < c.ai_generated) {
            return Err(anyhow!(
                "verdict cutoffs must be ordered: suspicious < likely_ai < ai_generated"
            ));
        }
        if !(0.0..=1.0).contains(&c.suspicious) || !(0.0..=1.0).contains(&c.ai_generated) {
            return Err(anyhow!("verdict confidence cutoffs must lie in [0, 1]"));
        }
        if self.limits.frame_sample_rate == 0 {
            return Err(anyhow!("frame_sample_rate must be at least 1"));
        }
        if self.limits.max_frames == 0 {
            return Err(anyhow!("max_frames must be at least 1"));
        }
        if self.limits.max_batch_files == 0 {
            return Err(anyhow!("max_batch_files must be at least 1"));
        }
        Ok(())
    }
}

fn lowercased(list: Vec<String>) -> Vec<String> {
    list.into_iter().map(|s| s.to_lowercase()).collect()
}

fn read_config_file(path: &Path) -> Result<DetectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;

    let cfg = if path.extension().map(|e| e == "toml").unwrap_or(false) {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid TOML config file {}: {}", path.display(), e))?
    } else if path.extension().map(|e| e == "json").unwrap_or(false) {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid JSON config file {}: {}", path.display(), e))?
    } else {
        match serde_json::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(json_err) => match toml::from_str(&raw) {
                Ok(cfg) => cfg,
                Err(toml_err) => {
                    return Err(anyhow!(
                        "invalid config file {} (tried JSON and TOML): json error: {}; toml error: {}",
                        path.display(),
                        json_err,
                        toml_err
                    ));
                }
            },
        }
    };
    Ok(cfg)
}

/// File extension classification for uploads and CLI inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

pub fn classify_extension(filename: &str) -> Option<MediaKind> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();
    if SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weight_total_is_canonical() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.weights.total(), 435);
        assert_eq!(cfg.weights.weight_of("watermark_detected"), Some(100));
        assert_eq!(cfg.weights.weight_of("edge_fragmented"), Some(15));
        assert_eq!(cfg.weights.weight_of("bogus_kind"), None);
    }

    #[test]
    fn file_overrides_thresholds_and_weights() {
        let file: DetectorConfigFile = toml::from_str(
            r#"
            [weights]
            metadata_suspicious = 55

            [thresholds]
            checkerboard_peak = 0.15
            dct_freq_ratio_ai_max = 0.22
            edge_continuity_ai_max = 0.6

            [verdict]
            mode = "score"
            "#,
        )
        .unwrap();
        let cfg = DetectorConfig::from_file(file).unwrap();
        assert_eq!(cfg.weights.weight_of("metadata_suspicious"), Some(55));
        assert_eq!(cfg.thresholds.checkerboard_peak, 0.15);
        assert_eq!(cfg.thresholds.dct_freq_ratio_ai_max, 0.22);
        assert_eq!(cfg.thresholds.edge_continuity_ai_max, 0.6);
        assert_eq!(cfg.cutoffs.mode, VerdictMode::Score);
    }

    #[test]
    fn rejects_unknown_weight_kind() {
        let file: DetectorConfigFile = toml::from_str(
            r#"
            [weights]
            not_a_kind = 10
            "#,
        )
        .unwrap();
        assert!(DetectorConfig::from_file(file).is_err());
    }

    #[test]
    fn rejects_unordered_cutoffs() {
        let mut cfg = DetectorConfig::default();
        cfg.cutoffs.suspicious = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn classifies_supported_extensions() {
        assert_eq!(classify_extension("photo.JPG"), Some(MediaKind::Image));
        assert_eq!(classify_extension("clip.mp4"), Some(MediaKind::Video));
        assert_eq!(classify_extension("archive.tar.gz"), None);
        assert_eq!(classify_extension("noext"), None);
    }
}
