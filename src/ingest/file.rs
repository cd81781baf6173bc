//! Local file video source.
//!
//! This module provides `FileSource` for sampling frames from local video files.
//! The file source is responsible for:
//! - Reading the container metadata (duration, dimensions)
//! - Seeking to a playback position and decoding the picture shown there
//! - Handing back RGB pictures for encoding
//!
//! The file source MUST NOT:
//! - Fetch remote URLs
//! - Retain decoded pictures beyond the current position

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use std::time::Duration;

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::{VideoMetadata, VideoSource};

const STUB_SCHEME: &str = "stub://";
const DEFAULT_STUB_DURATION_SECS: f64 = 10.0;
const DEFAULT_STUB_WIDTH: u32 = 160;
const DEFAULT_STUB_HEIGHT: u32 = 90;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path (e.g., "/data/match.mp4") or a `stub://` clip.
    pub path: String,
}

impl FileConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Local file video source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with(STUB_SCHEME) {
            Ok(Self {
                backend: FileBackend::Synthetic(SyntheticFileSource::new(config)?),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "file ingestion requires the ingest-file-ffmpeg feature"
                ))
            }
        }
    }
}

impl VideoSource for FileSource {
    fn describe(&self) -> String {
        match &self.backend {
            FileBackend::Synthetic(source) => source.describe(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.describe(),
        }
    }

    fn wait_for_metadata(&mut self, timeout: Duration) -> Result<Option<VideoMetadata>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.wait_for_metadata(timeout),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.wait_for_metadata(timeout),
        }
    }

    fn seek(&mut self, timestamp_secs: f64, timeout: Duration) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.seek(timestamp_secs, timeout),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.seek(timestamp_secs, timeout),
        }
    }

    fn capture(&mut self) -> Result<RgbImage> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.capture(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.capture(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

/// Options parsed from `stub://<name>?duration=..&width=..&height=..&metadata=never&seek=stall`.
#[derive(Clone, Debug, PartialEq)]
struct SyntheticOptions {
    name: String,
    duration_secs: f64,
    width: u32,
    height: u32,
    metadata_never_ready: bool,
    seek_stalls: bool,
}

impl SyntheticOptions {
    fn parse(path: &str) -> Result<Self> {
        let rest = path
            .strip_prefix(STUB_SCHEME)
            .ok_or_else(|| anyhow!("synthetic clip path must start with {}", STUB_SCHEME))?;
        let (name, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut options = Self {
            name: name.to_string(),
            duration_secs: DEFAULT_STUB_DURATION_SECS,
            width: DEFAULT_STUB_WIDTH,
            height: DEFAULT_STUB_HEIGHT,
            metadata_never_ready: false,
            seek_stalls: false,
        };

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "duration" => {
                    options.duration_secs = value
                        .parse()
                        .map_err(|_| anyhow!("invalid stub duration '{}'", value))?;
                }
                "width" => {
                    options.width = value
                        .parse()
                        .map_err(|_| anyhow!("invalid stub width '{}'", value))?;
                }
                "height" => {
                    options.height = value
                        .parse()
                        .map_err(|_| anyhow!("invalid stub height '{}'", value))?;
                }
                "metadata" => options.metadata_never_ready = value == "never",
                "seek" => options.seek_stalls = value == "stall",
                other => return Err(anyhow!("unknown stub option '{}'", other)),
            }
        }

        if options.width == 0 || options.height == 0 {
            return Err(anyhow!("stub clip dimensions must be non-zero"));
        }
        Ok(options)
    }
}

/// Renders a ball moving along an arc across a dark field.
struct SyntheticFileSource {
    options: SyntheticOptions,
    position_secs: f64,
    seeks: u64,
}

impl SyntheticFileSource {
    fn new(config: FileConfig) -> Result<Self> {
        Ok(Self {
            options: SyntheticOptions::parse(&config.path)?,
            position_secs: 0.0,
            seeks: 0,
        })
    }

    fn describe(&self) -> String {
        format!("stub://{} (synthetic)", self.options.name)
    }

    fn wait_for_metadata(&mut self, timeout: Duration) -> Result<Option<VideoMetadata>> {
        if self.options.metadata_never_ready {
            std::thread::sleep(timeout);
            return Ok(None);
        }
        Ok(Some(VideoMetadata {
            duration_secs: self.options.duration_secs,
            width: self.options.width,
            height: self.options.height,
        }))
    }

    fn seek(&mut self, timestamp_secs: f64, timeout: Duration) -> Result<()> {
        if self.options.seek_stalls {
            std::thread::sleep(timeout);
            anyhow::bail!("seek to {:.3}s did not complete", timestamp_secs);
        }
        self.seeks += 1;
        self.position_secs = timestamp_secs.clamp(0.0, self.options.duration_secs.max(0.0));
        log::trace!(
            "synthetic seek #{} to {:.3}s",
            self.seeks,
            self.position_secs
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<RgbImage> {
        let (x, y) = ball_position(self.position_secs, self.options.duration_secs);
        Ok(render_ball(self.options.width, self.options.height, x, y))
    }
}

/// Normalized ball centre at `t`: left to right along a parabolic arc.
fn ball_position(t: f64, duration: f64) -> (f64, f64) {
    let progress = if duration > 0.0 {
        (t / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let x = 0.1 + 0.8 * progress;
    let y = 0.8 - 2.4 * progress * (1.0 - progress);
    (x, y)
}

fn render_ball(width: u32, height: u32, x: f64, y: f64) -> RgbImage {
    let cx = x * width as f64;
    let cy = y * height as f64;
    let radius = (height.min(width) as f64 / 10.0).max(1.0);
    RgbImage::from_fn(width, height, |px, py| {
        let dx = px as f64 + 0.5 - cx;
        let dy = py as f64 + 0.5 - cy;
        if dx * dx + dy * dy <= radius * radius {
            Rgb([245, 245, 235])
        } else {
            Rgb([20, 60 + (py * 60 / height.max(1)) as u8, 30])
        }
    })
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with(STUB_SCHEME) {
        return true;
    }
    !path.contains("://")
}
