//! Rendering sink boundary.
//!
//! The pipeline forwards one overlay per frame to a sink and never learns
//! what the sink does with it. Sinks must not fail the loop: rendering
//! problems are logged and swallowed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::enrich::EnrichmentResult;
use crate::frame::{BoundingBox, Frame};

/// One accepted detection, ready for display.
#[derive(Clone, Debug)]
pub struct Annotation {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
    /// Enrichment value (or its degraded placeholder).
    pub value: String,
}

impl Annotation {
    pub fn new(
        bbox: BoundingBox,
        label: String,
        confidence: f32,
        enrichment: &EnrichmentResult,
    ) -> Self {
        Self {
            bbox,
            label,
            confidence,
            value: enrichment.value.clone(),
        }
    }
}

/// Per-frame overlay: either the accepted detections or an explicit
/// "no detection" hint. The sink receives exactly one of these per frame.
#[derive(Clone, Debug)]
pub enum Overlay {
    Detections(Vec<Annotation>),
    NoDetection,
}

/// Rendering sink. Receives the base frame plus overlay primitives.
pub trait RenderSink: Send {
    fn render(&mut self, frame: &Frame, overlay: &Overlay);
}

/// Sink that reports detections on the log channel.
pub struct LogSink;

impl RenderSink for LogSink {
    fn render(&mut self, frame: &Frame, overlay: &Overlay) {
        match overlay {
            Overlay::Detections(annotations) => {
                for a in annotations {
                    log::info!(
                        "frame #{}: {} conf={:.2} at ({}, {}) {}x{} value={}",
                        frame.sequence(),
                        a.label,
                        a.confidence,
                        a.bbox.x,
                        a.bbox.y,
                        a.bbox.width,
                        a.bbox.height,
                        a.value
                    );
                }
            }
            Overlay::NoDetection => {
                log::debug!("frame #{}: no detection", frame.sequence());
            }
        }
    }
}

/// Sink that draws hollow boxes on a copy of the frame and dumps JPEGs into a
/// directory. Useful for spot-checking a headless deployment.
pub struct ImageDumpSink {
    dir: PathBuf,
}

impl ImageDumpSink {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create dump dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn write_annotated(&self, frame: &Frame, annotations: &[Annotation]) -> Result<()> {
        let mut image = frame.image().clone();
        for a in annotations {
            let rect = Rect::at(a.bbox.x as i32, a.bbox.y as i32)
                .of_size(a.bbox.width.max(1), a.bbox.height.max(1));
            draw_hollow_rect_mut(&mut image, rect, image::Rgb([0, 255, 0]));
        }
        let path = self.dir.join(format!("frame_{:06}.jpg", frame.sequence()));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

impl RenderSink for ImageDumpSink {
    fn render(&mut self, frame: &Frame, overlay: &Overlay) {
        let Overlay::Detections(annotations) = overlay else {
            return;
        };
        if let Err(e) = self.write_annotated(frame, annotations) {
            log::error!("image dump failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{EnrichmentResult, EnrichmentStatus};
    use image::RgbImage;

    fn annotation() -> Annotation {
        Annotation::new(
            BoundingBox::new(10, 10, 40, 40),
            "Penny".to_string(),
            0.91,
            &EnrichmentResult {
                status: EnrichmentStatus::Found,
                value: "$0.01".to_string(),
            },
        )
    }

    #[test]
    fn log_sink_accepts_both_overlay_kinds() {
        let frame = Frame::new(RgbImage::new(64, 64), 1);
        let mut sink = LogSink;
        sink.render(&frame, &Overlay::Detections(vec![annotation()]));
        sink.render(&frame, &Overlay::NoDetection);
    }

    #[test]
    fn image_dump_sink_writes_one_file_per_detection_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = ImageDumpSink::new(dir.path().to_path_buf()).expect("sink");
        let frame = Frame::new(RgbImage::new(64, 64), 3);

        sink.render(&frame, &Overlay::Detections(vec![annotation()]));
        assert!(dir.path().join("frame_000003.jpg").exists());

        sink.render(&frame, &Overlay::NoDetection);
        let entries = std::fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn annotation_carries_enrichment_value() {
        let a = annotation();
        assert_eq!(a.value, "$0.01");
    }
}
