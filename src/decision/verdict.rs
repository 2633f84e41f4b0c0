use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decision::DetectionKind;

/// Confidence-derived verdict labels, most to least suspicious.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerdictLabel {
    AiGenerated,
    LikelyAiGenerated,
    Suspicious,
    LikelyReal,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::AiGenerated => "AI-Generated",
            VerdictLabel::LikelyAiGenerated => "Likely AI-Generated",
            VerdictLabel::Suspicious => "Suspicious",
            VerdictLabel::LikelyReal => "Likely Real",
        }
    }

    /// Rank for ordering checks; higher is more suspicious.
    pub fn severity(&self) -> u8 {
        match self {
            VerdictLabel::AiGenerated => 3,
            VerdictLabel::LikelyAiGenerated => 2,
            VerdictLabel::Suspicious => 1,
            VerdictLabel::LikelyReal => 0,
        }
    }
}

/// Final outcome for one asset. Serializes to plain JSON numbers; a
/// round trip through JSON reproduces the record exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub verdict: String,
    pub confidence: f64,
    pub total_score: u32,
    pub scores: BTreeMap<DetectionKind, u32>,
    pub evidence: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_strings() {
        assert_eq!(VerdictLabel::AiGenerated.as_str(), "AI-Generated");
        assert_eq!(VerdictLabel::LikelyReal.as_str(), "Likely Real");
        assert!(VerdictLabel::AiGenerated.severity() > VerdictLabel::Suspicious.severity());
    }

    #[test]
    fn verdict_json_round_trip() {
        let mut scores = BTreeMap::new();
        scores.insert(DetectionKind::MetadataSuspicious, 40u32);
        scores.insert(DetectionKind::C2paSynthetic, 90u32);
        let verdict = Verdict {
            verdict: "Suspicious".to_string(),
            confidence: 0.299,
            total_score: 130,
            scores,
            evidence: vec!["C2PA indicates synthetic content".to_string()],
        };
        let json = serde_json::to_string(&verdict).unwrap();
        let back: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, verdict);

        // Plain JSON numbers, no wrappers.
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["confidence"].is_f64());
        assert!(value["total_score"].is_u64());
        assert!(value["scores"]["c2pa_synthetic"].is_u64());
    }
}
