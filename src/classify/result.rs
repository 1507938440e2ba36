/// Result of classifying one prepared candidate.
///
/// Invariant: `confidence` is the maximum class probability and `label` its
/// argmax (ties broken by lowest index).
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f32,
}
