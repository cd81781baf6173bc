use std::sync::Mutex;
use std::time::Duration;

use tempfile::Builder;

use temporal_vision::config::AnalyzerConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "TEMPORAL_VISION_CONFIG",
        "TEMPORAL_VISION_BACKEND",
        "TEMPORAL_VISION_MODEL",
        "TEMPORAL_VISION_ENDPOINT",
        "TEMPORAL_VISION_API_KEY",
        "GEMINI_API_KEY",
        "TEMPORAL_VISION_ANALYSIS_FRAMES",
        "TEMPORAL_VISION_PREVIEW_FRAMES",
        "TEMPORAL_VISION_JPEG_QUALITY",
        "TEMPORAL_VISION_METADATA_TIMEOUT_MS",
        "TEMPORAL_VISION_SEEK_TIMEOUT_MS",
        "TEMPORAL_VISION_REQUEST_TIMEOUT_MS",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    std::io::Write::write_all(&mut file, contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = AnalyzerConfig::load().expect("load config");
    assert_eq!(cfg.classifier.backend, "gemini");
    assert_eq!(cfg.classifier.model, "gemini-2.0-flash");
    assert!(cfg.classifier.api_key.is_none());
    assert!(cfg.gemini().is_none());
    assert_eq!(cfg.sampling.analysis_frames, 10);
    assert_eq!(cfg.sampling.preview_frames, 12);
    assert_eq!(cfg.sampling.jpeg_quality, 70);
    assert_eq!(cfg.sampling.metadata_timeout, Duration::from_secs(5));
    assert_eq!(cfg.classifier.request_timeout, Duration::from_secs(60));
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{
            "sampling": {
                "analysis_frames": 24,
                "jpeg_quality": 85,
                "seek_timeout_ms": 1500
            },
            "classifier": {
                "backend": "Stub",
                "model": "gemini-1.5-pro",
                "api_key": "file-key"
            }
        }"#,
    );

    std::env::set_var("TEMPORAL_VISION_CONFIG", file.path());
    std::env::set_var("TEMPORAL_VISION_PREVIEW_FRAMES", "6");
    std::env::set_var("GEMINI_API_KEY", "env-key");

    let cfg = AnalyzerConfig::load().expect("load config");
    assert_eq!(cfg.classifier.backend, "stub");
    assert_eq!(cfg.classifier.model, "gemini-1.5-pro");
    assert_eq!(cfg.classifier.api_key.as_deref(), Some("env-key"));
    assert_eq!(cfg.sampling.analysis_frames, 24);
    assert_eq!(cfg.sampling.preview_frames, 6);
    assert_eq!(cfg.sampling.jpeg_quality, 85);
    assert_eq!(cfg.sampling.seek_timeout, Duration::from_millis(1500));

    let options = cfg.analysis_options();
    assert_eq!(options.frame_count, 24);
    assert_eq!(options.sampler.jpeg_quality, 85);
    let gemini = cfg.gemini().expect("gemini settings");
    assert_eq!(gemini.api_key, "env-key");
    assert_eq!(gemini.model, "gemini-1.5-pro");

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".toml",
        r#"
[sampling]
analysis_frames = 4

[classifier]
backend = "stub"
request_timeout_ms = 2000
"#,
    );
    std::env::set_var("TEMPORAL_VISION_CONFIG", file.path());

    let cfg = AnalyzerConfig::load().expect("load config");
    assert_eq!(cfg.sampling.analysis_frames, 4);
    assert_eq!(cfg.classifier.backend, "stub");
    assert_eq!(cfg.classifier.request_timeout, Duration::from_secs(2));

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TEMPORAL_VISION_ANALYSIS_FRAMES", "0");
    assert!(AnalyzerConfig::load().is_err());
    clear_env();

    std::env::set_var("TEMPORAL_VISION_JPEG_QUALITY", "101");
    assert!(AnalyzerConfig::load().is_err());
    clear_env();

    std::env::set_var("TEMPORAL_VISION_SEEK_TIMEOUT_MS", "soon");
    assert!(AnalyzerConfig::load().is_err());
    clear_env();

    let file = write_config(".json", r#"{ "sampling": { "frames": 3 } }"#);
    std::env::set_var("TEMPORAL_VISION_CONFIG", file.path());
    assert!(AnalyzerConfig::load().is_err(), "unknown fields are rejected");

    clear_env();
}
