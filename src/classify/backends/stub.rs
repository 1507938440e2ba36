use anyhow::{anyhow, Result};

use crate::classify::backend::ClassifierBackend;
use crate::preprocess::InputTensor;

/// Stub backend for testing and the `stub://` demo path.
///
/// Replays a fixed probability vector for every candidate.
pub struct StubClassifier {
    probabilities: Vec<f32>,
}

impl StubClassifier {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self { probabilities }
    }
}

impl ClassifierBackend for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn output_width(&self) -> usize {
        self.probabilities.len()
    }

    fn infer(&mut self, _input: &InputTensor) -> Result<Vec<f32>> {
        if self.probabilities.is_empty() {
            return Err(anyhow!("stub classifier configured with no classes"));
        }
        Ok(self.probabilities.clone())
    }
}
