use anyhow::Result;

use crate::preprocess::InputTensor;

/// Classifier backend trait.
///
/// A backend wraps one opaque trained model. Its only contract is the
/// boundary: one normalized input tensor in, one probability vector out,
/// index-aligned with the session's `ClassSet`. Loading failures are fatal to
/// the session and must surface before any frame is processed.
pub trait ClassifierBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Width of the model's output vector.
    fn output_width(&self) -> usize;

    /// Run inference on one prepared candidate.
    ///
    /// Deterministic for a fixed model: the same tensor yields the same
    /// probability vector.
    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
