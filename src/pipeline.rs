//! Frame loop orchestrator.
//!
//! Pulls frames from the source and drives, per candidate, the
//! extract → preprocess → classify → decide chain, then enriches accepted
//! outcomes and forwards one overlay per frame to the rendering sink.
//!
//! The loop is single-threaded and synchronous: classification and
//! enrichment for candidate N complete before candidate N+1 begins, and a
//! slow inference or network call stalls the whole iteration. Cancellation
//! is cooperative, polled once per iteration boundary before the next frame
//! pull; mid-iteration cancellation is not supported.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::classify::ClassifierAdapter;
use crate::config::CoinwatchConfig;
use crate::decide::DecisionGate;
use crate::enrich::EnrichmentClient;
use crate::extract::RegionExtractor;
use crate::frame::{Candidate, Frame};
use crate::preprocess::{Normalization, Preprocessor};
use crate::render::{Annotation, Overlay, RenderSink};
use crate::source::FrameSource;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Session state of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Counters reported when the loop stops.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub candidates_classified: u64,
    pub accepted: u64,
    pub enrichment_cache_hits: u64,
}

/// The detection-classification-decision loop.
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    sink: Box<dyn RenderSink>,
    extractor: RegionExtractor,
    preprocessor: Preprocessor,
    classifier: ClassifierAdapter,
    gate: DecisionGate,
    enrichment: EnrichmentClient,
    cancel: Arc<AtomicBool>,
    state: LoopState,
    frame_cap: Option<u64>,
    summary: RunSummary,
}

impl Pipeline {
    /// Wire the loop from resolved configuration and its collaborators.
    pub fn new(
        config: &CoinwatchConfig,
        source: Box<dyn FrameSource>,
        classifier: ClassifierAdapter,
        enrichment: EnrichmentClient,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        Self {
            source,
            sink,
            extractor: RegionExtractor::new(&config.extractor),
            preprocessor: Preprocessor::new(config.classifier.img_size, Normalization::default()),
            classifier,
            gate: DecisionGate::new(config.classifier.confidence_threshold),
            enrichment,
            cancel: Arc::new(AtomicBool::new(false)),
            state: LoopState::Idle,
            frame_cap: None,
            summary: RunSummary::default(),
        }
    }

    /// Install an external cancel token (e.g. wired to a quit keypress).
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop after at most `cap` frames. Debug aid for bounded runs.
    pub fn with_frame_cap(mut self, cap: u64) -> Self {
        self.frame_cap = Some(cap);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until cancel, source exhaustion, or a frame read failure.
    ///
    /// Fatal setup failures (source open, classifier warm-up) are reported
    /// here before any frame is processed; once running, per-candidate and
    /// source errors degrade or end the loop without surfacing as `Err`.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.source.connect().context("failed to open frame source")?;
        self.classifier
            .warm_up()
            .context("classifier warm-up failed")?;
        self.state = LoopState::Running;
        log::info!(
            "pipeline running: backend={} classes={} threshold={:.2}",
            self.classifier.backend_name(),
            self.classifier.classes().len(),
            self.gate.threshold()
        );

        let mut last_health_log = Instant::now();
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("cancel requested; stopping loop");
                break;
            }
            if let Some(cap) = self.frame_cap {
                if self.summary.frames_processed >= cap {
                    log::info!("frame cap {} reached; stopping loop", cap);
                    break;
                }
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("frame source exhausted; stopping loop");
                    break;
                }
                Err(e) => {
                    log::error!("frame read failed: {:#}", e);
                    break;
                }
            };

            self.process_frame(&frame);
            self.summary.frames_processed += 1;

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = self.source.stats();
                log::info!(
                    "source health={} frames={} url={}",
                    self.source.is_healthy(),
                    stats.frames_captured,
                    stats.source
                );
                last_health_log = Instant::now();
            }
        }

        self.source.close();
        self.state = LoopState::Stopped;
        self.summary.enrichment_cache_hits = self.enrichment.cache_hits();
        Ok(self.summary.clone())
    }

    /// One iteration's candidate fan-out. Candidate outcomes are independent:
    /// no candidate's result affects another within the same frame.
    fn process_frame(&mut self, frame: &Frame) {
        let boxes = self.extractor.extract(frame);
        let mut annotations = Vec::new();

        for candidate in boxes.into_iter().map(|bbox| Candidate::new(bbox, frame)) {
            let bbox = candidate.bbox;
            if bbox.is_degenerate() || !bbox.fits_within(frame.width(), frame.height()) {
                log::debug!(
                    "dropping malformed candidate ({}, {}) {}x{}",
                    bbox.x,
                    bbox.y,
                    bbox.width,
                    bbox.height
                );
                continue;
            }

            let tensor = match self.preprocessor.prepare(candidate.frame, &bbox) {
                Ok(tensor) => tensor,
                Err(e) => {
                    log::debug!("dropping candidate: {:#}", e);
                    continue;
                }
            };

            let classification = match self.classifier.classify(&tensor) {
                Ok(classification) => classification,
                Err(e) => {
                    log::warn!("inference failed for candidate: {:#}", e);
                    continue;
                }
            };
            self.summary.candidates_classified += 1;

            let outcome = self.gate.decide(classification);
            if !outcome.accepted {
                continue;
            }
            self.summary.accepted += 1;

            let enrichment = self.enrichment.lookup(&outcome.classification.label);
            annotations.push(Annotation::new(
                bbox,
                outcome.classification.label,
                outcome.classification.confidence,
                &enrichment,
            ));
        }

        let overlay = if annotations.is_empty() {
            Overlay::NoDetection
        } else {
            Overlay::Detections(annotations)
        };
        self.sink.render(frame, &overlay);
    }
}
