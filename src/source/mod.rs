//! Frame sources.
//!
//! The pipeline consumes frames through the `FrameSource` trait:
//! - `StubSource` (`stub://`): synthetic scenes for tests and demos.
//! - `MjpegSource` (`http(s)://`): MJPEG or single-JPEG HTTP cameras.
//!
//! Sources decode in-memory, decimate to a target frame rate, and report
//! health and capture statistics. Device selection beyond the URL scheme is
//! out of scope.

mod mjpeg;
mod stub;

use anyhow::Result;

pub use mjpeg::MjpegSource;
pub use stub::StubSource;

use crate::config::SourceSettings;
use crate::frame::Frame;

/// Sequence-of-frames capability.
pub trait FrameSource: Send {
    /// Establish the capture session.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame. `Ok(None)` signals end of stream; errors are
    /// transport failures the caller may treat as loop-ending.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// True while the source is producing frames at a plausible rate.
    fn is_healthy(&self) -> bool;

    /// Capture statistics.
    fn stats(&self) -> SourceStats;

    /// Release the capture session. Called exactly once when the loop stops.
    fn close(&mut self) {}
}

/// Statistics common to all sources.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// Build a source from settings, dispatching on the URL scheme.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.url.starts_with("stub://") {
        Ok(Box::new(StubSource::new(settings.clone())))
    } else {
        Ok(Box::new(MjpegSource::new(settings.clone())?))
    }
}
