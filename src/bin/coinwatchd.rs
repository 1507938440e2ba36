//! coinwatchd - coin detection daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured source (stub or HTTP MJPEG)
//! 2. Extracts coin-sized candidate regions per frame
//! 3. Classifies candidates and gates them on confidence
//! 4. Enriches accepted detections against the reference endpoint
//! 5. Forwards annotated overlays to the rendering sink
//!
//! It exits on Ctrl-C, source exhaustion, or a frame read failure.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use coinwatch::{
    classify::{ClassSet, ClassifierAdapter, ClassifierBackend},
    config::CoinwatchConfig,
    enrich::EnrichmentClient,
    pipeline::Pipeline,
    render::{ImageDumpSink, LogSink, RenderSink},
    source::open_source,
};

#[derive(Parser, Debug)]
#[command(name = "coinwatchd", about = "Live coin detection daemon")]
struct Args {
    /// Config file path (JSON). Falls back to COINWATCH_CONFIG.
    #[arg(long, env = "COINWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write annotated JPEGs into this directory.
    #[arg(long, env = "COINWATCH_DUMP_DIR")]
    dump_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = CoinwatchConfig::load_from(args.config.as_deref())?;
    log::info!(
        "coinwatchd {}: source={} model={} threshold={:.2}",
        env!("CARGO_PKG_VERSION"),
        cfg.source.url,
        cfg.classifier.model_path,
        cfg.classifier.confidence_threshold
    );

    let source = open_source(&cfg.source)?;
    let classifier = build_classifier(&cfg)?;
    let enrichment = EnrichmentClient::new(&cfg.enrichment);
    let sink: Box<dyn RenderSink> = match args.dump_dir {
        Some(dir) => Box::new(ImageDumpSink::new(dir)?),
        None => Box::new(LogSink),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_flag.store(true, Ordering::Relaxed);
    })?;

    let mut pipeline =
        Pipeline::new(&cfg, source, classifier, enrichment, sink).with_cancel(cancel);
    if let Some(cap) = args.max_frames {
        pipeline = pipeline.with_frame_cap(cap);
    }

    let summary = pipeline.run()?;
    log::info!(
        "stopped: frames={} classified={} accepted={} cache_hits={}",
        summary.frames_processed,
        summary.candidates_classified,
        summary.accepted,
        summary.enrichment_cache_hits
    );
    Ok(())
}

/// Model load failures are fatal to the session and surface here, before the
/// loop starts.
fn build_classifier(cfg: &CoinwatchConfig) -> Result<ClassifierAdapter> {
    let backend = load_backend(cfg)?;
    match &cfg.classifier.class_list {
        Some(path) => {
            let classes = ClassSet::from_file(path)?;
            if classes.len() < backend.output_width() {
                log::warn!(
                    "class list has {} names for an output width of {}; \
                     out-of-range indices will read as Unknown",
                    classes.len(),
                    backend.output_width()
                );
            }
            Ok(ClassifierAdapter::new(backend, classes))
        }
        None => Ok(ClassifierAdapter::with_synthetic_classes(backend)),
    }
}

#[cfg(feature = "backend-tract")]
fn load_backend(cfg: &CoinwatchConfig) -> Result<Box<dyn ClassifierBackend>> {
    use coinwatch::classify::TractClassifier;
    let backend = TractClassifier::load(&cfg.classifier.model_path, cfg.classifier.img_size)?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn load_backend(_cfg: &CoinwatchConfig) -> Result<Box<dyn ClassifierBackend>> {
    use coinwatch::classify::StubClassifier;
    log::warn!("built without backend-tract; using stub classifier");
    Ok(Box::new(StubClassifier::new(vec![0.1, 0.8, 0.1])))
}
