//! coinwatch
//!
//! Live coin detection, classification and value enrichment.
//!
//! # Architecture
//!
//! The pipeline inspects a live video feed, isolates coin-shaped regions,
//! classifies each against a trained model, and — when confidence clears a
//! threshold — enriches the result with a reference-value lookup before
//! forwarding annotations to a rendering sink.
//!
//! Data flows strictly downstream per candidate; no candidate's outcome
//! affects another within the same frame. The frame loop is the only
//! stateful orchestrator; the stages are pure functions over their inputs
//! (the enrichment client additionally holds a session cache).
//!
//! # Module Structure
//!
//! - `frame`: Frame, BoundingBox and Candidate data model
//! - `source`: frame sources (synthetic stub, HTTP MJPEG)
//! - `extract`: coin-sized candidate region extraction
//! - `preprocess`: crop/resize/normalize for inference
//! - `classify`: classifier backends, class set and argmax adapter
//! - `decide`: confidence-gated acceptance
//! - `enrich`: reference-value lookup with degraded-result fallback
//! - `render`: rendering sink boundary
//! - `pipeline`: the frame loop

pub mod classify;
pub mod config;
pub mod decide;
pub mod enrich;
pub mod extract;
pub mod frame;
pub mod pipeline;
pub mod preprocess;
pub mod render;
pub mod source;

pub use classify::{ClassSet, ClassificationResult, ClassifierAdapter, ClassifierBackend, StubClassifier};
#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
pub use config::CoinwatchConfig;
pub use decide::{DecisionGate, DecisionOutcome};
pub use enrich::{
    EnrichmentClient, EnrichmentResult, EnrichmentStatus, FetchError, PageFetcher, UreqFetcher,
};
pub use extract::RegionExtractor;
pub use frame::{BoundingBox, Candidate, Frame};
pub use pipeline::{LoopState, Pipeline, RunSummary};
pub use preprocess::{InputTensor, Normalization, Preprocessor};
pub use render::{Annotation, ImageDumpSink, LogSink, Overlay, RenderSink};
pub use source::{open_source, FrameSource, MjpegSource, SourceStats, StubSource};
