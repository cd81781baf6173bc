//! Sampled frames.
//!
//! - `EncodedImage`: compressed still image (JPEG) produced at sampling time.
//! - `Frame`: an encoded image plus the playback timestamp it was captured at.
//!
//! Frames are immutable once captured and live only as long as the analysis
//! session that owns them. A failed capture produces a frame with an empty
//! image; it is carried through the pipeline like any other frame.

use anyhow::{Context, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use sha2::{Digest, Sha256};

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Default JPEG quality for sampled frames (0.7 on a 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Compressed still image. Bytes are opaque to the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: &'static str,
    bytes: Vec<u8>,
}

impl EncodedImage {
    /// Encode an RGB picture as JPEG at `quality` (1..=100).
    pub fn encode_jpeg(picture: &RgbImage, quality: u8) -> Result<Self> {
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
            .encode_image(picture)
            .with_context(|| {
                format!(
                    "encode {}x{} frame as jpeg",
                    picture.width(),
                    picture.height()
                )
            })?;
        Ok(Self {
            mime_type: JPEG_MIME_TYPE,
            bytes,
        })
    }

    /// Wrap already-encoded JPEG bytes.
    pub fn from_jpeg_bytes(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE,
            bytes,
        }
    }

    /// Result of a failed capture.
    pub fn empty() -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE,
            bytes: Vec::new(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard base64 of the image bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<data>`, or `data:,` for an empty image.
    pub fn to_data_uri(&self) -> String {
        if self.bytes.is_empty() {
            return "data:,".to_string();
        }
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Hex SHA-256 of the encoded bytes.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// A sampled video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Playback position the frame was captured at, in seconds.
    pub timestamp_secs: f64,
    image: EncodedImage,
}

impl Frame {
    pub fn new(timestamp_secs: f64, image: EncodedImage) -> Self {
        Self {
            timestamp_secs,
            image,
        }
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn into_image(self) -> EncodedImage {
        self.image
    }

    /// Timestamp rendered the way reports show it.
    pub fn timestamp_label(&self) -> String {
        format_timestamp(self.timestamp_secs)
    }
}

/// Seconds with millisecond precision, e.g. `1.500`.
pub fn format_timestamp(seconds: f64) -> String {
    format!("{:.3}", seconds)
}
