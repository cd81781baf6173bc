//! Frame ingestion sources.
//!
//! This module provides the sources a video can be sampled from:
//! - Local video files decoded with FFmpeg (`ingest-file-ffmpeg` feature)
//! - Synthetic clips (`stub://`) for tests and offline runs
//!
//! Every source implements `VideoSource`, which models a seekable player:
//! wait for metadata, move the playback position, rasterize the current
//! picture. `FrameSampler` drives a source to produce encoded `Frame`s.
//!
//! The ingestion layer MUST NOT:
//! - Fetch remote URLs
//! - Retry failed seeks (a failed capture yields an empty frame)

use anyhow::Result;
use image::RgbImage;
use std::time::Duration;

mod clock;
pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
mod file_ffmpeg;
pub mod sampler;

pub use file::{FileConfig, FileSource};
pub use sampler::{sample_timestamps, FrameSampler, SamplePlan, SamplerOptions};

/// Properties reported once the container header has been read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMetadata {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    /// True when the duration can anchor a sampling plan.
    pub fn has_usable_duration(&self) -> bool {
        self.duration_secs.is_finite() && self.duration_secs > 0.0
    }
}

/// A seekable video player.
///
/// Calls are strictly sequential: at most one seek is in flight, and
/// `capture` rasterizes whatever the last completed seek left on screen.
pub trait VideoSource {
    /// Human-readable source identifier for logs and reports.
    fn describe(&self) -> String;

    /// Block until metadata is available. Returns `None` when it is not
    /// ready within `timeout`.
    fn wait_for_metadata(&mut self, timeout: Duration) -> Result<Option<VideoMetadata>>;

    /// Move the playback position and wait until the picture is ready.
    /// Fails when the seek does not complete within `timeout`.
    fn seek(&mut self, timestamp_secs: f64, timeout: Duration) -> Result<()>;

    /// Rasterize the currently displayed picture.
    fn capture(&mut self) -> Result<RgbImage>;
}
