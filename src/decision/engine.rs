//! Evidence-weighted scoring engine.
//!
//! The engine knows nothing about what the probes mean: it is a weighted-OR
//! accumulator over named detection kinds plus an ordered evidence log.
//! Created per asset, mutated from a single collector, consumed once.

use std::collections::BTreeMap;

use crate::config::{DetectorConfig, ScoreWeights, VerdictCutoffs, VerdictMode};
use crate::decision::{DetectionKind, Verdict, VerdictLabel};

/// Comparison applied by [`DecisionEngine::add_metric_score`].
#[derive(Clone, Copy, Debug)]
pub enum MetricCmp {
    Less(f64),
    Greater(f64),
    Between(f64, f64),
}

impl MetricCmp {
    fn matches(&self, value: f64) -> bool {
        match *self {
            MetricCmp::Less(threshold) => value < threshold,
            MetricCmp::Greater(threshold) => value > threshold,
            MetricCmp::Between(lo, hi) => (lo..=hi).contains(&value),
        }
    }
}

pub struct DecisionEngine {
    weights: ScoreWeights,
    cutoffs: VerdictCutoffs,
    scores: BTreeMap<DetectionKind, u32>,
    evidence: Vec<String>,
}

impl DecisionEngine {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            weights: cfg.weights.clone(),
            cutoffs: cfg.cutoffs.clone(),
            scores: BTreeMap::new(),
            evidence: Vec::new(),
        }
    }

    /// Append a human-readable evidence line without scoring anything.
    pub fn note_evidence(&mut self, text: impl Into<String>) {
        self.evidence.push(text.into());
    }

    /// Record a named detection. A kind contributes its configured weight at
    /// most once; re-adding neither accumulates weight nor duplicates
    /// evidence. Unknown kinds contribute nothing beyond a diagnostic line.
    pub fn add_detection(&mut self, kind: &str, detected: bool, evidence: Option<&str>) {
        if !detected {
            return;
        }
        let Some(parsed) = DetectionKind::parse(kind) else {
            self.evidence.push(format!("unknown detection kind: {kind}"));
            return;
        };
        let Some(weight) = self.weights.weight_of(kind) else {
            self.evidence.push(format!("unknown detection kind: {kind}"));
            return;
        };
        if self.scores.contains_key(&parsed) {
            return;
        }
        self.scores.insert(parsed, weight);
        if let Some(text) = evidence {
            self.evidence.push(text.to_string());
        }
    }

    /// Threshold a scalar metric and delegate to [`Self::add_detection`].
    pub fn add_metric_score(
        &mut self,
        name: &str,
        value: f64,
        cmp: MetricCmp,
        evidence: Option<&str>,
    ) {
        self.add_detection(name, cmp.matches(value), evidence);
    }

    /// Derive the verdict from the accumulated scores. Idempotent: repeated
    /// calls without further mutation return identical records.
    pub fn calculate_verdict(&self) -> Verdict {
        let total_score: u32 = self.scores.values().sum();
        let max_possible = self.weights.total();
        let confidence = if max_possible == 0 {
            0.0
        } else {
            (total_score as f64 / max_possible as f64).min(1.0)
        };
        let confidence = (confidence * 1000.0).round() / 1000.0;

        let verdict = match self.cutoffs.mode {
            VerdictMode::Confidence => self.label_from_confidence(confidence).as_str().to_string(),
            VerdictMode::Score => self.label_from_score(total_score).to_string(),
        };

        Verdict {
            verdict,
            confidence,
            total_score,
            scores: self.scores.clone(),
            evidence: self.evidence.clone(),
        }
    }

    fn label_from_confidence(&self, confidence: f64) -> VerdictLabel {
        if confidence >= self.cutoffs.ai_generated {
            VerdictLabel::AiGenerated
        } else if confidence >= self.cutoffs.likely_ai {
            VerdictLabel::LikelyAiGenerated
        } else if confidence >= self.cutoffs.suspicious {
            VerdictLabel::Suspicious
        } else {
            VerdictLabel::LikelyReal
        }
    }

    fn label_from_score(&self, total: u32) -> &'static str {
        if total >= self.cutoffs.score_high {
            "AI-Generated (High Confidence)"
        } else if total >= self.cutoffs.score_medium {
            "AI-Generated (Medium Confidence)"
        } else if total >= self.cutoffs.score_suspicious {
            "Suspicious"
        } else {
            "Likely Real"
        }
    }

    /// Clear scores and evidence for reuse.
    pub fn reset(&mut self) {
        self.scores.clear();
        self.evidence.clear();
    }
}
