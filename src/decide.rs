//! Confidence-gated acceptance.
//!
//! Stateless and pure: the same object reappearing across frames is evaluated
//! independently each time. Callers wanting temporal stability must add their
//! own smoothing outside this gate.

use crate::classify::ClassificationResult;

/// Outcome of gating one classification.
#[derive(Clone, Debug)]
pub struct DecisionOutcome {
    pub classification: ClassificationResult,
    pub accepted: bool,
}

/// Applies the confidence threshold to classifications.
#[derive(Clone, Copy, Debug)]
pub struct DecisionGate {
    threshold: f32,
}

impl DecisionGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Accept iff `confidence > threshold`. The inequality is strict: a
    /// classification sitting exactly at the threshold is rejected.
    pub fn decide(&self, classification: ClassificationResult) -> DecisionOutcome {
        let accepted = classification.confidence > self.threshold;
        DecisionOutcome {
            classification,
            accepted,
        }
    }
}
