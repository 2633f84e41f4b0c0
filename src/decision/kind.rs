use serde::{Deserialize, Serialize};

/// Closed set of named detection signals. Each carries a fixed default
/// weight; probes cannot attenuate a contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    WatermarkDetected,
    C2paSynthetic,
    MetadataSuspicious,
    CheckboardPattern,
    TemporalFlicker,
    FreqRatioAnomaly,
    NoiseVarianceLow,
    MotionVectorIrregular,
    RgbCorrelationHigh,
    ShadowInconsistent,
    EdgeFragmented,
}

impl DetectionKind {
    pub const ALL: [DetectionKind; 11] = [
        DetectionKind::WatermarkDetected,
        DetectionKind::C2paSynthetic,
        DetectionKind::MetadataSuspicious,
        DetectionKind::CheckboardPattern,
        DetectionKind::TemporalFlicker,
        DetectionKind::FreqRatioAnomaly,
        DetectionKind::NoiseVarianceLow,
        DetectionKind::MotionVectorIrregular,
        DetectionKind::RgbCorrelationHigh,
        DetectionKind::ShadowInconsistent,
        DetectionKind::EdgeFragmented,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectionKind::WatermarkDetected => "watermark_detected",
            DetectionKind::C2paSynthetic => "c2pa_synthetic",
            DetectionKind::MetadataSuspicious => "metadata_suspicious",
            DetectionKind::CheckboardPattern => "checkboard_pattern",
            DetectionKind::TemporalFlicker => "temporal_flicker",
            DetectionKind::FreqRatioAnomaly => "freq_ratio_anomaly",
            DetectionKind::NoiseVarianceLow => "noise_variance_low",
            DetectionKind::MotionVectorIrregular => "motion_vector_irregular",
            DetectionKind::RgbCorrelationHigh => "rgb_correlation_high",
            DetectionKind::ShadowInconsistent => "shadow_inconsistent",
            DetectionKind::EdgeFragmented => "edge_fragmented",
        }
    }

    pub fn parse(name: &str) -> Option<DetectionKind> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn default_weight(&self) -> u32 {
        match self {
            DetectionKind::WatermarkDetected => 100,
            DetectionKind::C2paSynthetic => 90,
            DetectionKind::MetadataSuspicious => 40,
            DetectionKind::CheckboardPattern => 40,
            DetectionKind::TemporalFlicker => 35,
            DetectionKind::FreqRatioAnomaly => 30,
            DetectionKind::NoiseVarianceLow => 25,
            DetectionKind::MotionVectorIrregular => 25,
            DetectionKind::RgbCorrelationHigh => 20,
            DetectionKind::ShadowInconsistent => 15,
            DetectionKind::EdgeFragmented => 15,
        }
    }
}

impl std::fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
