use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::analysis::{AnalysisOptions, DEFAULT_ANALYSIS_FRAMES, DEFAULT_PREVIEW_FRAMES};
use crate::classify::backends::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::classify::GeminiConfig;
use crate::frame::DEFAULT_JPEG_QUALITY;
use crate::ingest::SamplerOptions;

const DEFAULT_BACKEND: &str = "gemini";
const DEFAULT_METADATA_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SEEK_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AnalyzerConfigFile {
    sampling: Option<SamplingConfigFile>,
    classifier: Option<ClassifierConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SamplingConfigFile {
    analysis_frames: Option<usize>,
    preview_frames: Option<usize>,
    jpeg_quality: Option<u8>,
    metadata_timeout_ms: Option<u64>,
    seek_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ClassifierConfigFile {
    backend: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key: Option<String>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub sampling: SamplingSettings,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone)]
pub struct SamplingSettings {
    pub analysis_frames: usize,
    pub preview_frames: usize,
    pub jpeg_quality: u8,
    pub metadata_timeout: Duration,
    pub seek_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub backend: String,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl AnalyzerConfig {
    /// File named by `TEMPORAL_VISION_CONFIG` (if any), then environment
    /// overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TEMPORAL_VISION_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AnalyzerConfigFile) -> Self {
        let sampling = file.sampling.unwrap_or_default();
        let classifier = file.classifier.unwrap_or_default();
        Self {
            sampling: SamplingSettings {
                analysis_frames: sampling.analysis_frames.unwrap_or(DEFAULT_ANALYSIS_FRAMES),
                preview_frames: sampling.preview_frames.unwrap_or(DEFAULT_PREVIEW_FRAMES),
                jpeg_quality: sampling.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
                metadata_timeout: Duration::from_millis(
                    sampling
                        .metadata_timeout_ms
                        .unwrap_or(DEFAULT_METADATA_TIMEOUT_MS),
                ),
                seek_timeout: Duration::from_millis(
                    sampling.seek_timeout_ms.unwrap_or(DEFAULT_SEEK_TIMEOUT_MS),
                ),
            },
            classifier: ClassifierSettings {
                backend: classifier
                    .backend
                    .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
                model: classifier
                    .model
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                endpoint: classifier
                    .endpoint
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                api_key: classifier.api_key.filter(|key| !key.trim().is_empty()),
                request_timeout: Duration::from_millis(
                    classifier
                        .request_timeout_ms
                        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
                ),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(backend) = env_string("TEMPORAL_VISION_BACKEND") {
            self.classifier.backend = backend;
        }
        if let Some(model) = env_string("TEMPORAL_VISION_MODEL") {
            self.classifier.model = model;
        }
        if let Some(endpoint) = env_string("TEMPORAL_VISION_ENDPOINT") {
            self.classifier.endpoint = endpoint;
        }
        if let Some(key) =
            env_string("TEMPORAL_VISION_API_KEY").or_else(|| env_string("GEMINI_API_KEY"))
        {
            self.classifier.api_key = Some(key);
        }
        if let Some(frames) = env_parse::<usize>("TEMPORAL_VISION_ANALYSIS_FRAMES")? {
            self.sampling.analysis_frames = frames;
        }
        if let Some(frames) = env_parse::<usize>("TEMPORAL_VISION_PREVIEW_FRAMES")? {
            self.sampling.preview_frames = frames;
        }
        if let Some(quality) = env_parse::<u8>("TEMPORAL_VISION_JPEG_QUALITY")? {
            self.sampling.jpeg_quality = quality;
        }
        if let Some(ms) = env_parse::<u64>("TEMPORAL_VISION_METADATA_TIMEOUT_MS")? {
            self.sampling.metadata_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("TEMPORAL_VISION_SEEK_TIMEOUT_MS")? {
            self.sampling.seek_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("TEMPORAL_VISION_REQUEST_TIMEOUT_MS")? {
            self.classifier.request_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.sampling.analysis_frames == 0 {
            return Err(anyhow!("analysis_frames must be at least 1"));
        }
        if self.sampling.preview_frames == 0 {
            return Err(anyhow!("preview_frames must be at least 1"));
        }
        if !(1..=100).contains(&self.sampling.jpeg_quality) {
            return Err(anyhow!("jpeg_quality must be within 1..=100"));
        }
        if self.sampling.metadata_timeout.is_zero() || self.sampling.seek_timeout.is_zero() {
            return Err(anyhow!("sampling timeouts must be greater than zero"));
        }
        if self.classifier.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        self.classifier.backend = self.classifier.backend.trim().to_lowercase();
        if self.classifier.backend.is_empty() {
            return Err(anyhow!("classifier backend must not be empty"));
        }
        Ok(())
    }

    pub fn sampler_options(&self) -> SamplerOptions {
        SamplerOptions {
            jpeg_quality: self.sampling.jpeg_quality,
            metadata_timeout: self.sampling.metadata_timeout,
            seek_timeout: self.sampling.seek_timeout,
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            frame_count: self.sampling.analysis_frames,
            sampler: self.sampler_options(),
        }
    }

    /// Gemini settings, when an API key is configured.
    pub fn gemini(&self) -> Option<GeminiConfig> {
        let api_key = self.classifier.api_key.clone()?;
        Some(GeminiConfig {
            api_key,
            model: self.classifier.model.clone(),
            endpoint: self.classifier.endpoint.clone(),
            request_timeout: self.classifier.request_timeout,
        })
    }
}

/// JSON by default; TOML when the file extension is `.toml`.
fn read_config_file(path: &Path) -> Result<AnalyzerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a non-negative integer, got '{}'", key, raw)),
        None => Ok(None),
    }
}
