//! Frame and region data model.
//!
//! - `Frame`: one captured RGB raster, immutable for the duration of a loop
//!   iteration and owned by the frame loop.
//! - `BoundingBox`: a candidate region in frame-pixel coordinates. A box is
//!   only meaningful within the frame that produced it.
//! - `Candidate`: a box paired with a borrow of its source frame; created per
//!   frame and discarded after classification.

use image::RgbImage;

/// One captured frame. Width/height/channel depth are fixed for a session by
/// the frame source; the pipeline never mutates pixel data.
pub struct Frame {
    image: RgbImage,
    sequence: u64,
}

impl Frame {
    /// Called by frame sources when a capture completes.
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Monotonic capture index within the session.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// Axis-aligned region in frame-pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box with zero width or height carries no pixels and must be dropped
    /// before preprocessing.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the box lies fully inside a frame of the given dimensions.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= frame_width && b <= frame_height)
    }
}

/// A detected region hypothesized to contain a coin, tied to its source frame.
pub struct Candidate<'a> {
    pub bbox: BoundingBox,
    pub frame: &'a Frame,
}

impl<'a> Candidate<'a> {
    pub fn new(bbox: BoundingBox, frame: &'a Frame) -> Self {
        Self { bbox, frame }
    }
}
