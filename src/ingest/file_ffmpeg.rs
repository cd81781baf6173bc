//! Local file video source using FFmpeg.
//!
//! Seeks jump to the nearest preceding key frame and decode forward until the
//! first picture at or after the requested position. That picture is kept as
//! the "displayed" frame until the next seek. Positions are relative to the
//! video track's start time. At end of file the decoder is drained so pictures
//! held back for reordering are still considered.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::time::{Duration, Instant};

use super::clock::StreamClock;
use super::file::FileConfig;
use super::VideoMetadata;

pub(crate) struct FfmpegFileSource {
    config: FileConfig,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    clock: StreamClock,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    metadata: Option<VideoMetadata>,
    displayed: Option<RgbImage>,
    seek_count: u64,
}

impl FfmpegFileSource {
    pub(crate) fn new(config: FileConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path)
            .with_context(|| format!("failed to open file input '{}' with ffmpeg", config.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("file has no video track"))?;
        let stream_index = input_stream.index();
        let time_base = f64::from(input_stream.time_base());
        let stream_duration = input_stream.duration();
        let clock = StreamClock::new(time_base, input_stream.start_time());
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        let duration_secs = if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
        } else if stream_duration > 0 {
            stream_duration as f64 * time_base
        } else {
            0.0
        };
        let metadata = (duration_secs > 0.0).then(|| VideoMetadata {
            duration_secs,
            width: decoder.width(),
            height: decoder.height(),
        });

        log::info!(
            "FileSource: opened {} (ffmpeg, {}x{}, {:.3}s, starts at {:.3}s)",
            config.path,
            decoder.width(),
            decoder.height(),
            duration_secs,
            clock.start_secs()
        );

        Ok(Self {
            config,
            input,
            stream_index,
            clock,
            decoder,
            scaler,
            metadata,
            displayed: None,
            seek_count: 0,
        })
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} (ffmpeg)", self.config.path)
    }

    /// The container header is read at open time; metadata is either there or
    /// never will be.
    pub(crate) fn wait_for_metadata(&mut self, _timeout: Duration) -> Result<Option<VideoMetadata>> {
        Ok(self.metadata)
    }

    pub(crate) fn seek(&mut self, timestamp_secs: f64, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        self.displayed = None;
        self.seek_count += 1;

        let target = self.clock.seek_target(timestamp_secs);
        self.input
            .seek(target, ..target)
            .with_context(|| format!("seek to {:.3}s", timestamp_secs))?;
        self.decoder.flush();

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut packets_left = true;

        while packets_left {
            if started.elapsed() > timeout {
                anyhow::bail!("seek to {:.3}s did not complete", timestamp_secs);
            }
            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    self.decoder
                        .send_packet(&packet)
                        .context("send packet to ffmpeg decoder")?;
                }
                None => {
                    self.decoder
                        .send_eof()
                        .context("drain ffmpeg decoder")?;
                    packets_left = false;
                }
            }

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if self.show_if_reached(&decoded, timestamp_secs)? {
                    return Ok(());
                }
            }
        }

        Err(anyhow!(
            "file ended before position {:.3}s was decoded",
            timestamp_secs
        ))
    }

    /// Keep `decoded` as the displayed picture when it is at or past the
    /// requested position.
    fn show_if_reached(&mut self, decoded: &ffmpeg::frame::Video, timestamp_secs: f64) -> Result<bool> {
        let pts = decoded.timestamp().or_else(|| decoded.pts());
        if !self.clock.reached(pts, timestamp_secs) {
            return Ok(false);
        }
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        self.displayed = Some(frame_to_image(&rgb_frame)?);
        log::trace!(
            "ffmpeg seek #{} landed at {:?}s for target {:.3}s",
            self.seek_count,
            pts.map(|pts| self.clock.position_of(pts)),
            timestamp_secs
        );
        Ok(true)
    }

    pub(crate) fn capture(&mut self) -> Result<RgbImage> {
        self.displayed
            .clone()
            .ok_or_else(|| anyhow!("no decoded picture at the current position"))
    }
}

fn frame_to_image(frame: &ffmpeg::frame::Video) -> Result<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    let pixels = if stride == row_bytes {
        data.get(..row_bytes * height as usize)
            .context("ffmpeg frame is shorter than its dimensions")?
            .to_vec()
    } else {
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_bytes;
            pixels.extend_from_slice(
                data.get(start..end)
                    .context("ffmpeg frame row is out of bounds")?,
            );
        }
        pixels
    };

    RgbImage::from_raw(width, height, pixels).context("assemble RGB picture")
}
