//! Synthetic frame source (`stub://`).
//!
//! Renders a bright disc drifting over a dark background, so the region
//! extractor has a coin-sized contour to find without any camera attached.

use anyhow::Result;
use image::RgbImage;
use imageproc::drawing::draw_filled_circle_mut;

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const DISC_RADIUS: i32 = 40;

pub struct StubSource {
    settings: SourceSettings,
    frame_count: u64,
    frame_limit: Option<u64>,
}

impl StubSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            frame_limit: None,
        }
    }

    /// Signal end-of-stream after `limit` frames; used to exercise loop
    /// shutdown.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    fn render_scene(&self) -> RgbImage {
        let mut image = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, image::Rgb([8, 8, 8]));
        // Drift the disc one pixel per frame so consecutive frames differ.
        let cx = 120 + (self.frame_count % 200) as i32;
        let cy = 200 + (self.frame_count % 60) as i32;
        draw_filled_circle_mut(&mut image, (cx, cy), DISC_RADIUS, image::Rgb([220, 210, 160]));
        image
    }
}

impl FrameSource for StubSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("StubSource: connected to {} (synthetic)", self.settings.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(limit) = self.frame_limit {
            if self.frame_count >= limit {
                return Ok(None);
            }
        }
        let image = self.render_scene();
        let frame = Frame::new(image, self.frame_count);
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.settings.url.clone(),
        }
    }
}
