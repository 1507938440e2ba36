//! HTTP MJPEG / single-JPEG frame source.
//!
//! Connects to an HTTP camera endpoint, scans the multipart stream for JPEG
//! frame boundaries (or re-fetches a snapshot URL per frame), decodes
//! in-memory, and decimates to the configured frame rate.

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

pub struct MjpegSource {
    settings: SourceSettings,
    stream: Option<HttpStream>,
    last_frame_at: Option<Instant>,
    connected_at: Option<Instant>,
    frame_count: u64,
}

enum HttpStream {
    Mjpeg(MjpegStream),
    SingleJpeg,
}

impl MjpegSource {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        if !settings.url.starts_with("http://") && !settings.url.starts_with("https://") {
            return Err(anyhow!(
                "unsupported source url '{}'; expected http(s) or stub",
                settings.url
            ));
        }
        Ok(Self {
            settings,
            stream: None,
            last_frame_at: None,
            connected_at: None,
            frame_count: 0,
        })
    }
}

impl FrameSource for MjpegSource {
    fn connect(&mut self) -> Result<()> {
        let response = ureq::get(&self.settings.url)
            .call()
            .context("connect to http camera stream")?;
        let content_type = response.header("Content-Type").unwrap_or("");
        if content_type.to_lowercase().contains("multipart") {
            let reader = response.into_reader();
            self.stream = Some(HttpStream::Mjpeg(MjpegStream::new(reader)));
        } else {
            self.stream = Some(HttpStream::SingleJpeg);
        }
        self.connected_at = Some(Instant::now());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("http source not connected; call connect() first"))?;
        let min_interval = frame_interval(self.settings.target_fps);
        loop {
            let jpeg_bytes = match stream {
                HttpStream::Mjpeg(stream) => match stream.read_next_jpeg()? {
                    Some(bytes) => bytes,
                    None => return Ok(None),
                },
                HttpStream::SingleJpeg => fetch_single_jpeg(&self.settings.url)?,
            };

            let now = Instant::now();
            if let Some(last) = self.last_frame_at {
                if now.duration_since(last) < min_interval {
                    continue;
                }
            }

            let image = image::load_from_memory(&jpeg_bytes)
                .context("decode jpeg frame")?
                .into_rgb8();
            let frame = Frame::new(image, self.frame_count);
            self.frame_count += 1;
            self.last_frame_at = Some(now);
            return Ok(Some(frame));
        }
    }

    fn is_healthy(&self) -> bool {
        let Some(connected_at) = self.connected_at else {
            return false;
        };
        let Some(last_frame_at) = self.last_frame_at else {
            return connected_at.elapsed() <= Duration::from_secs(5);
        };
        last_frame_at.elapsed() <= health_grace(self.settings.target_fps)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.settings.url.clone(),
        }
    }
}

struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    /// Scan the multipart stream for the next complete JPEG. `Ok(None)` means
    /// the stream ended.
    fn read_next_jpeg(&mut self) -> Result<Option<Vec<u8>>> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = find_jpeg_bounds(&self.buffer) {
                let frame = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(Some(frame));
            }

            let read = self.reader.read(&mut chunk).context("read mjpeg chunk")?;
            if read == 0 {
                return Ok(None);
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            if self.buffer.len() > MAX_JPEG_BYTES * 2 {
                let keep = 2.min(self.buffer.len());
                let drain_len = self.buffer.len() - keep;
                self.buffer.drain(..drain_len);
            }
        }
    }
}

fn fetch_single_jpeg(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch jpeg snapshot from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .context("read jpeg snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty jpeg snapshot"));
    }
    Ok(bytes)
}

/// SOI/EOI marker scan over the buffered multipart payload.
fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut start = None;
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == 0xFF && buffer[i + 1] == 0xD8 {
            start = Some(i);
            break;
        }
        i += 1;
    }
    let start = start?;
    let mut j = start + 2;
    while j + 1 < buffer.len() {
        if buffer[j] == 0xFF && buffer[j + 1] == 0xD9 {
            return Some((start, j + 2));
        }
        j += 1;
    }
    None
}

fn frame_interval(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::from_millis(0)
    } else {
        Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

fn health_grace(target_fps: u32) -> Duration {
    let base_ms = if target_fps == 0 {
        2_000
    } else {
        (1000 / target_fps).saturating_mul(6)
    };
    Duration::from_millis(base_ms.max(2_000) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        let settings = SourceSettings {
            url: "rtsp://camera".to_string(),
            target_fps: 10,
        };
        assert!(MjpegSource::new(settings).is_err());
    }

    #[test]
    fn next_frame_before_connect_is_an_error() {
        let settings = SourceSettings {
            url: "http://127.0.0.1:81/stream".to_string(),
            target_fps: 10,
        };
        let mut source = MjpegSource::new(settings).expect("source");
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn jpeg_bounds_scan_finds_complete_frames() {
        let mut data = vec![0x00, 0x01];
        data.extend_from_slice(&[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
        data.extend_from_slice(&[0x02, 0x03]);
        let (start, end) = find_jpeg_bounds(&data).expect("bounds");
        assert_eq!(&data[start..end], &[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
    }

    #[test]
    fn jpeg_bounds_scan_waits_for_eoi() {
        let data = [0xFF, 0xD8, 0xAA, 0xBB];
        assert!(find_jpeg_bounds(&data).is_none());
    }

    #[test]
    fn mjpeg_stream_end_is_not_an_error() {
        let mut stream = MjpegStream::new(Box::new(std::io::empty()));
        assert!(stream.read_next_jpeg().expect("read").is_none());
    }
}
