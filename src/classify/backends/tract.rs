#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::backend::ClassifierBackend;
use crate::preprocess::InputTensor;

/// Tract-based backend for ONNX inference.
///
/// Loads a local model file once at startup; a missing or malformed artifact
/// fails the session here, before the frame loop starts.
pub struct TractClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    img_size: u32,
    output_width: usize,
}

impl TractClassifier {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load<P: AsRef<Path>>(model_path: P, img_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = img_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        let output_fact = model
            .model()
            .output_fact(0)
            .map_err(|e| anyhow!("model has no output fact: {}", e))?;
        let dims = output_fact
            .shape
            .as_concrete()
            .ok_or_else(|| anyhow!("model output shape is not static"))?;
        let output_width = dims.iter().skip(1).copied().product::<usize>().max(1);

        Ok(Self {
            model,
            img_size,
            output_width,
        })
    }

    fn build_input(&self, input: &InputTensor) -> Result<Tensor> {
        if input.size() != self.img_size {
            return Err(anyhow!(
                "tensor size {} does not match model input {}",
                input.size(),
                self.img_size
            ));
        }
        let size = self.img_size as usize;
        // Preprocessor output is NHWC; the model wants NCHW.
        let array = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            input.at(y, x, c)
        });
        Ok(array.into_tensor())
    }
}

impl ClassifierBackend for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn output_width(&self) -> usize {
        self.output_width
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        let input = self.build_input(input)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(scores.iter().copied().collect())
    }
}
