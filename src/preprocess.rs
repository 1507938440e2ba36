//! Candidate preprocessing for inference.
//!
//! Crops the candidate box out of the frame, resizes it to the classifier's
//! input size, and applies the model's declared per-channel normalization,
//! producing a `1 × S × S × 3` f32 tensor.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};

use crate::frame::{BoundingBox, Frame};

/// Per-channel normalization declared by the model.
///
/// A pixel value `p` in `0..=255` maps to `(p * scale - mean[c]) / std[c]`.
#[derive(Clone, Copy, Debug)]
pub struct Normalization {
    pub scale: f32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            scale: 1.0 / 255.0,
            mean: [0.0; 3],
            std: [1.0; 3],
        }
    }
}

/// Normalized classifier input with a leading batch dimension of 1.
///
/// Layout is NHWC: `data[(y * size + x) * 3 + c]`.
pub struct InputTensor {
    data: Vec<f32>,
    size: u32,
}

impl InputTensor {
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.size as usize, self.size as usize, 3]
    }

    /// Channel value at pixel `(x, y)`; used by backends that need NCHW.
    pub fn at(&self, y: usize, x: usize, channel: usize) -> f32 {
        self.data[(y * self.size as usize + x) * 3 + channel]
    }
}

/// Pure crop/resize/normalize transform.
pub struct Preprocessor {
    img_size: u32,
    normalization: Normalization,
}

impl Preprocessor {
    pub fn new(img_size: u32, normalization: Normalization) -> Self {
        Self {
            img_size,
            normalization,
        }
    }

    /// Prepare one candidate region for inference.
    ///
    /// Fails on degenerate (zero-width/height) boxes and boxes that fall
    /// outside the frame; callers must clip or reject those upstream.
    pub fn prepare(&self, frame: &Frame, bbox: &BoundingBox) -> Result<InputTensor> {
        if bbox.is_degenerate() {
            return Err(anyhow!(
                "degenerate bounding box {}x{} at ({}, {})",
                bbox.width,
                bbox.height,
                bbox.x,
                bbox.y
            ));
        }
        if !bbox.fits_within(frame.width(), frame.height()) {
            return Err(anyhow!(
                "bounding box ({}, {}) {}x{} exceeds frame bounds {}x{}",
                bbox.x,
                bbox.y,
                bbox.width,
                bbox.height,
                frame.width(),
                frame.height()
            ));
        }

        let crop =
            imageops::crop_imm(frame.image(), bbox.x, bbox.y, bbox.width, bbox.height).to_image();
        let resized = imageops::resize(&crop, self.img_size, self.img_size, FilterType::Triangle);

        let n = self.normalization;
        let mut data = Vec::with_capacity((self.img_size * self.img_size * 3) as usize);
        for pixel in resized.pixels() {
            for (channel, value) in pixel.0.iter().enumerate() {
                data.push((*value as f32 * n.scale - n.mean[channel]) / n.std[channel]);
            }
        }

        Ok(InputTensor {
            data,
            size: self.img_size,
        })
    }
}
