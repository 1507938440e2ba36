use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use coinwatch::config::CoinwatchConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "COINWATCH_CONFIG",
        "COINWATCH_SOURCE_URL",
        "COINWATCH_MODEL_PATH",
        "COINWATCH_CLASS_LIST",
        "COINWATCH_CONFIDENCE_THRESHOLD",
        "COINWATCH_ENRICHMENT_URL",
        "COINWATCH_REQUEST_TIMEOUT_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": {
            "url": "http://camera-1:81/stream",
            "target_fps": 12
        },
        "classifier": {
            "model_path": "models/coins_v3.onnx",
            "img_size": 128,
            "confidence_threshold": 0.9,
            "class_list": "models/coins_v3.classes.json"
        },
        "extractor": {
            "area_min": 2000.0,
            "area_max": 40000.0
        },
        "enrichment": {
            "base_url": "https://coinvalue.example.org/coins",
            "request_timeout_secs": 5
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("COINWATCH_CONFIG", file.path());
    std::env::set_var("COINWATCH_SOURCE_URL", "stub://bench_camera");
    std::env::set_var("COINWATCH_REQUEST_TIMEOUT_SECS", "3");

    let cfg = CoinwatchConfig::load().expect("load config");

    // Env overrides win over the file.
    assert_eq!(cfg.source.url, "stub://bench_camera");
    assert_eq!(cfg.enrichment.request_timeout, Duration::from_secs(3));

    // File values survive where no override is set.
    assert_eq!(cfg.source.target_fps, 12);
    assert_eq!(cfg.classifier.model_path, "models/coins_v3.onnx");
    assert_eq!(cfg.classifier.img_size, 128);
    assert!((cfg.classifier.confidence_threshold - 0.9).abs() < 1e-6);
    assert_eq!(
        cfg.classifier.class_list.as_deref(),
        Some(std::path::Path::new("models/coins_v3.classes.json"))
    );
    assert_eq!(cfg.extractor.area_min, 2000.0);
    assert_eq!(cfg.extractor.area_max, 40000.0);
    // The trailing slash is appended during validation.
    assert_eq!(cfg.enrichment.base_url, "https://coinvalue.example.org/coins/");

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = CoinwatchConfig::load().expect("load defaults");
    assert_eq!(cfg.source.url, "stub://bench_camera");
    assert_eq!(cfg.classifier.img_size, 224);
    assert!((cfg.classifier.confidence_threshold - 0.85).abs() < 1e-6);
    assert_eq!(cfg.enrichment.request_timeout, Duration::from_secs(10));
    assert!(cfg.enrichment.base_url.ends_with('/'));

    clear_env();
}

#[test]
fn invalid_threshold_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("COINWATCH_CONFIDENCE_THRESHOLD", "not-a-number");
    assert!(CoinwatchConfig::load().is_err());

    std::env::set_var("COINWATCH_CONFIDENCE_THRESHOLD", "1.5");
    assert!(CoinwatchConfig::load().is_err());

    clear_env();
}

#[test]
fn malformed_config_file_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("COINWATCH_CONFIG", file.path());

    assert!(CoinwatchConfig::load().is_err());

    clear_env();
}
