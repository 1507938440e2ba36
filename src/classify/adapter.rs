use anyhow::{anyhow, Result};

use crate::classify::backend::ClassifierBackend;
use crate::classify::classes::ClassSet;
use crate::classify::result::ClassificationResult;
use crate::preprocess::InputTensor;

/// Wraps an opaque classifier backend and maps its probability vector onto
/// the session's class set.
pub struct ClassifierAdapter {
    backend: Box<dyn ClassifierBackend>,
    classes: ClassSet,
}

impl ClassifierAdapter {
    pub fn new(backend: Box<dyn ClassifierBackend>, classes: ClassSet) -> Self {
        Self { backend, classes }
    }

    /// Build the adapter with synthetic class names derived from the model's
    /// output width, for sessions without a class-list artifact.
    pub fn with_synthetic_classes(backend: Box<dyn ClassifierBackend>) -> Self {
        let classes = ClassSet::synthetic(backend.output_width());
        Self::new(backend, classes)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.backend.warm_up()
    }

    /// Classify one prepared candidate.
    ///
    /// `confidence` is the maximum probability, `label` its argmax; ties are
    /// broken by the lowest index.
    pub fn classify(&mut self, input: &InputTensor) -> Result<ClassificationResult> {
        let probabilities = self.backend.infer(input)?;
        let (index, confidence) = argmax(&probabilities)
            .ok_or_else(|| anyhow!("classifier produced an empty probability vector"))?;
        Ok(ClassificationResult {
            label: self.classes.label(index).to_string(),
            confidence,
        })
    }
}

fn argmax(probabilities: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &p) in probabilities.iter().enumerate() {
        match best {
            // Strict comparison keeps the lowest index on ties.
            Some((_, max)) if p <= max => {}
            _ => best = Some((index, p)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::StubClassifier;
    use crate::frame::{BoundingBox, Frame};
    use crate::preprocess::{Normalization, Preprocessor};

    fn tensor() -> InputTensor {
        let frame = Frame::new(image::RgbImage::new(32, 32), 0);
        Preprocessor::new(8, Normalization::default())
            .prepare(&frame, &BoundingBox::new(0, 0, 32, 32))
            .expect("prepare")
    }

    fn adapter(probabilities: Vec<f32>, classes: ClassSet) -> ClassifierAdapter {
        ClassifierAdapter::new(Box::new(StubClassifier::new(probabilities)), classes)
    }

    #[test]
    fn label_is_argmax_and_confidence_is_max() {
        let classes = ClassSet::new(vec!["Dime".into(), "Penny".into(), "Nickel".into()]);
        let mut adapter = adapter(vec![0.02, 0.91, 0.07], classes);
        let result = adapter.classify(&tensor()).expect("classify");
        assert_eq!(result.label, "Penny");
        assert!((result.confidence - 0.91).abs() < 1e-6);
    }

    #[test]
    fn ties_break_to_lowest_index() {
        let classes = ClassSet::new(vec!["Dime".into(), "Penny".into()]);
        let mut adapter = adapter(vec![0.5, 0.5], classes);
        let result = adapter.classify(&tensor()).expect("classify");
        assert_eq!(result.label, "Dime");
    }

    #[test]
    fn index_beyond_class_set_maps_to_unknown() {
        let classes = ClassSet::new(vec!["Dime".into()]);
        let mut adapter = adapter(vec![0.1, 0.9], classes);
        let result = adapter.classify(&tensor()).expect("classify");
        assert_eq!(result.label, "Unknown");
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn empty_probability_vector_is_an_error() {
        let mut adapter = adapter(vec![], ClassSet::synthetic(0));
        assert!(adapter.classify(&tensor()).is_err());
    }

    #[test]
    fn synthetic_classes_match_output_width() {
        let adapter =
            ClassifierAdapter::with_synthetic_classes(Box::new(StubClassifier::new(vec![
                0.2, 0.3, 0.5,
            ])));
        assert_eq!(adapter.classes().len(), 3);
    }
}
