//! Evenly spaced frame sampling.

use std::time::Duration;

use anyhow::Result;

use super::{VideoMetadata, VideoSource};
use crate::frame::{EncodedImage, Frame, DEFAULT_JPEG_QUALITY};

pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug)]
pub struct SamplerOptions {
    /// JPEG quality for captured frames (1..=100).
    pub jpeg_quality: u8,
    /// Upper bound on waiting for the video metadata.
    pub metadata_timeout: Duration,
    /// Upper bound on a single seek.
    pub seek_timeout: Duration,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
        }
    }
}

/// Timestamps chosen for one sampling pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplePlan {
    pub metadata: VideoMetadata,
    pub timestamps: Vec<f64>,
}

/// `i * duration / count` for `i in 0..count`.
///
/// Strictly increasing and inside `[0, duration)` whenever `duration > 0`.
pub fn sample_timestamps(duration_secs: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let interval = duration_secs / count as f64;
    (0..count).map(|i| i as f64 * interval).collect()
}

/// Drives a `VideoSource` through seek-and-capture.
pub struct FrameSampler<'a> {
    source: &'a mut dyn VideoSource,
    options: SamplerOptions,
}

impl<'a> FrameSampler<'a> {
    pub fn new(source: &'a mut dyn VideoSource, options: SamplerOptions) -> Self {
        Self { source, options }
    }

    /// Wait for metadata and lay out `count` timestamps.
    ///
    /// Returns `None` when metadata is not ready within the configured bound or
    /// the reported duration cannot anchor a plan; callers then sample nothing.
    pub fn prepare(&mut self, count: usize) -> Result<Option<SamplePlan>> {
        let Some(metadata) = self
            .source
            .wait_for_metadata(self.options.metadata_timeout)?
        else {
            log::warn!(
                "metadata for {} not ready within {}ms; sampling nothing",
                self.source.describe(),
                self.options.metadata_timeout.as_millis()
            );
            return Ok(None);
        };

        if !metadata.has_usable_duration() {
            log::warn!(
                "{} reports unusable duration {}; sampling nothing",
                self.source.describe(),
                metadata.duration_secs
            );
            return Ok(None);
        }

        log::debug!(
            "sampling {} frames from {} ({:.3}s, {}x{})",
            count,
            self.source.describe(),
            metadata.duration_secs,
            metadata.width,
            metadata.height
        );

        Ok(Some(SamplePlan {
            metadata,
            timestamps: sample_timestamps(metadata.duration_secs, count),
        }))
    }

    /// Seek, wait, rasterize and encode the picture at `timestamp_secs`.
    ///
    /// Never fails: any seek/capture/encode error is logged and yields a frame
    /// with an empty image, which callers keep and process like any other.
    pub fn capture_at(&mut self, timestamp_secs: f64) -> Frame {
        match self.try_capture(timestamp_secs) {
            Ok(image) => Frame::new(timestamp_secs, image),
            Err(e) => {
                log::warn!(
                    "capture at {:.3}s from {} failed: {:#}",
                    timestamp_secs,
                    self.source.describe(),
                    e
                );
                Frame::new(timestamp_secs, EncodedImage::empty())
            }
        }
    }

    /// Prepare and capture `count` frames in timestamp order.
    pub fn sample(&mut self, count: usize) -> Result<Vec<Frame>> {
        let Some(plan) = self.prepare(count)? else {
            return Ok(Vec::new());
        };
        Ok(plan
            .timestamps
            .iter()
            .map(|&timestamp| self.capture_at(timestamp))
            .collect())
    }

    fn try_capture(&mut self, timestamp_secs: f64) -> Result<EncodedImage> {
        self.source.seek(timestamp_secs, self.options.seek_timeout)?;
        let picture = self.source.capture()?;
        EncodedImage::encode_jpeg(&picture, self.options.jpeg_quality)
    }
}
