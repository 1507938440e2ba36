use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SOURCE_URL: &str = "stub://bench_camera";
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_MODEL_PATH: &str = "coin_classifier.onnx";
const DEFAULT_IMG_SIZE: u32 = 224;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.85;
const DEFAULT_ENRICHMENT_BASE_URL: &str = "https://coinvalue.example.org/coins/";
const DEFAULT_AREA_MIN: f64 = 1_000.0;
const DEFAULT_AREA_MAX: f64 = 50_000.0;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
struct CoinwatchConfigFile {
    source: Option<SourceConfigFile>,
    classifier: Option<ClassifierConfigFile>,
    extractor: Option<ExtractorConfigFile>,
    enrichment: Option<EnrichmentConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    model_path: Option<String>,
    img_size: Option<u32>,
    confidence_threshold: Option<f32>,
    class_list: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct ExtractorConfigFile {
    area_min: Option<f64>,
    area_max: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct EnrichmentConfigFile {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Immutable pipeline configuration, fully resolved before the loop starts.
///
/// There is no process-wide mutable state: the daemon builds one of these and
/// hands it to the pipeline at construction time.
#[derive(Debug, Clone)]
pub struct CoinwatchConfig {
    pub source: SourceSettings,
    pub classifier: ClassifierSettings,
    pub extractor: ExtractorSettings,
    pub enrichment: EnrichmentSettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub model_path: String,
    pub img_size: u32,
    pub confidence_threshold: f32,
    /// Versioned class-list artifact supplied alongside the model. When
    /// absent, synthetic `Class_0..Class_{N-1}` names are used.
    pub class_list: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub area_min: f64,
    pub area_max: f64,
}

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl CoinwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("COINWATCH_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CoinwatchConfigFile) -> Self {
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|source| source.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let classifier = ClassifierSettings {
            model_path: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.model_path.clone())
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            img_size: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.img_size)
                .unwrap_or(DEFAULT_IMG_SIZE),
            confidence_threshold: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            class_list: file.classifier.and_then(|classifier| classifier.class_list),
        };
        let extractor = ExtractorSettings {
            area_min: file
                .extractor
                .as_ref()
                .and_then(|extractor| extractor.area_min)
                .unwrap_or(DEFAULT_AREA_MIN),
            area_max: file
                .extractor
                .as_ref()
                .and_then(|extractor| extractor.area_max)
                .unwrap_or(DEFAULT_AREA_MAX),
        };
        let enrichment = EnrichmentSettings {
            base_url: file
                .enrichment
                .as_ref()
                .and_then(|enrichment| enrichment.base_url.clone())
                .unwrap_or_else(|| DEFAULT_ENRICHMENT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                file.enrichment
                    .and_then(|enrichment| enrichment.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        };
        Self {
            source,
            classifier,
            extractor,
            enrichment,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("COINWATCH_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(path) = std::env::var("COINWATCH_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.classifier.model_path = path;
            }
        }
        if let Ok(path) = std::env::var("COINWATCH_CLASS_LIST") {
            if !path.trim().is_empty() {
                self.classifier.class_list = Some(PathBuf::from(path));
            }
        }
        if let Ok(threshold) = std::env::var("COINWATCH_CONFIDENCE_THRESHOLD") {
            let value: f32 = threshold.parse().map_err(|_| {
                anyhow!("COINWATCH_CONFIDENCE_THRESHOLD must be a number in [0, 1]")
            })?;
            self.classifier.confidence_threshold = value;
        }
        if let Ok(url) = std::env::var("COINWATCH_ENRICHMENT_URL") {
            if !url.trim().is_empty() {
                self.enrichment.base_url = url;
            }
        }
        if let Ok(timeout) = std::env::var("COINWATCH_REQUEST_TIMEOUT_SECS") {
            let seconds: u64 = timeout.parse().map_err(|_| {
                anyhow!("COINWATCH_REQUEST_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.enrichment.request_timeout = Duration::from_secs(seconds);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.classifier.img_size == 0 {
            return Err(anyhow!("img_size must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.classifier.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must lie in [0, 1]"));
        }
        if self.extractor.area_min < 0.0 {
            return Err(anyhow!("area_min must be non-negative"));
        }
        if self.extractor.area_min >= self.extractor.area_max {
            return Err(anyhow!("area_min must be strictly below area_max"));
        }
        if self.enrichment.request_timeout.as_secs() == 0 {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.enrichment.base_url.trim().is_empty() {
            return Err(anyhow!("enrichment base_url must not be empty"));
        }
        // The lookup key is appended directly; a trailing slash keeps the
        // final URL shape `base + key + "/"` well-formed.
        if !self.enrichment.base_url.ends_with('/') {
            self.enrichment.base_url.push('/');
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CoinwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
