//! Sequential seek -> capture -> classify loop.
//!
//! Frame 0 is recorded as the baseline. Every later frame is classified
//! against the frame captured just before it, one request at a time. A failed
//! classification is logged and the frame is left out of the results; the
//! loop carries on and the next pair still uses the failed frame as its
//! predecessor.

use anyhow::Result;

use crate::classify::{ClassificationError, ClassifierVerdict, PairClassifier};
use crate::frame::Frame;
use crate::ingest::{FrameSampler, SamplerOptions, VideoSource};
use crate::session::{AnalysisSession, ClassificationResult, Progress};

pub const DEFAULT_ANALYSIS_FRAMES: usize = 10;
pub const DEFAULT_PREVIEW_FRAMES: usize = 12;

#[derive(Clone, Copy, Debug)]
pub struct AnalysisOptions {
    /// Number of evenly spaced frames to sample.
    pub frame_count: usize,
    pub sampler: SamplerOptions,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_ANALYSIS_FRAMES,
            sampler: SamplerOptions::default(),
        }
    }
}

/// What happened to one sampled frame.
#[derive(Debug)]
pub enum FrameOutcome {
    Recorded(ClassificationResult),
    Skipped {
        frame_index: u32,
        timestamp_secs: f64,
        error: ClassificationError,
    },
}

impl FrameOutcome {
    pub fn frame_index(&self) -> u32 {
        match self {
            Self::Recorded(result) => result.frame_index,
            Self::Skipped { frame_index, .. } => *frame_index,
        }
    }
}

/// Progress hooks for presenters.
pub trait AnalysisObserver {
    fn on_plan(&mut self, _total_frames: usize) {}

    fn on_frame(&mut self, _progress: Progress, _outcome: &FrameOutcome) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl AnalysisObserver for NoopObserver {}

/// Counters for a finished pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisRun {
    pub sampled: usize,
    pub recorded: usize,
    pub skipped: Vec<u32>,
}

/// Run one analysis pass over the session's video.
///
/// Returns `None` when nothing was started: no video is loaded or the session
/// is already busy.
pub fn run_analysis(
    session: &mut AnalysisSession,
    source: &mut dyn VideoSource,
    classifier: &mut dyn PairClassifier,
    options: &AnalysisOptions,
    observer: &mut dyn AnalysisObserver,
) -> Result<Option<AnalysisRun>> {
    if !session.can_begin() {
        log::debug!("analysis not started: no video loaded or session busy");
        return Ok(None);
    }

    let mut sampler = FrameSampler::new(source, options.sampler);
    let timestamps = sampler
        .prepare(options.frame_count)?
        .map(|plan| plan.timestamps)
        .unwrap_or_default();

    if !session.begin_analysis(timestamps.len()) {
        return Ok(None);
    }
    observer.on_plan(timestamps.len());

    if let Err(e) = classifier.warm_up() {
        log::warn!("classifier {} warm-up failed: {}", classifier.name(), e);
    }

    log::info!(
        "analyzing {} frames of {} with {}",
        timestamps.len(),
        session.video().unwrap_or_default(),
        classifier.name()
    );

    let mut run = AnalysisRun {
        sampled: timestamps.len(),
        ..AnalysisRun::default()
    };
    let mut previous: Option<Frame> = None;

    for (i, &timestamp) in timestamps.iter().enumerate() {
        let frame_index = i as u32;
        let current = sampler.capture_at(timestamp);

        let outcome = match &previous {
            None => Ok(ClassificationResult::baseline(&current)),
            Some(prev) => classifier
                .classify_pair(prev, &current, frame_index)
                .and_then(ClassifierVerdict::validate)
                .map(|verdict| ClassificationResult::from_verdict(frame_index, &current, verdict)),
        };

        let outcome = match outcome {
            Ok(result) => {
                session.append_result(result.clone())?;
                run.recorded += 1;
                FrameOutcome::Recorded(result)
            }
            Err(error) => {
                log::warn!(
                    "classification of frame {} ({:.3}s) failed, skipping: {}",
                    frame_index,
                    timestamp,
                    error
                );
                run.skipped.push(frame_index);
                FrameOutcome::Skipped {
                    frame_index,
                    timestamp_secs: timestamp,
                    error,
                }
            }
        };

        previous = Some(current);
        session.set_progress(i + 1)?;
        observer.on_frame(session.progress(), &outcome);
    }

    session.finish_analysis();
    log::info!(
        "analysis finished: {} recorded, {} skipped",
        run.recorded,
        run.skipped.len()
    );
    Ok(Some(run))
}

/// Sample the preview gallery into the session.
///
/// Returns the number of frames captured, or `None` when nothing was started.
pub fn run_preview(
    session: &mut AnalysisSession,
    source: &mut dyn VideoSource,
    frame_count: usize,
    options: SamplerOptions,
) -> Result<Option<usize>> {
    if !session.begin_sampling() {
        return Ok(None);
    }
    let frames = match FrameSampler::new(source, options).sample(frame_count) {
        Ok(frames) => frames,
        Err(e) => {
            session.finish_sampling(Vec::new());
            return Err(e);
        }
    };
    let captured = frames.len();
    session.finish_sampling(frames);
    Ok(Some(captured))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{StubClassifier, TransitionLabel};
    use crate::ingest::{FileConfig, FileSource};
    use std::time::Duration;

    fn options(frame_count: usize) -> AnalysisOptions {
        AnalysisOptions {
            frame_count,
            sampler: SamplerOptions {
                metadata_timeout: Duration::from_millis(5),
                seek_timeout: Duration::from_millis(5),
                ..SamplerOptions::default()
            },
        }
    }

    #[test]
    fn noop_without_video() {
        let mut session = AnalysisSession::new();
        let mut source = FileSource::new(FileConfig::new("stub://clip")).unwrap();
        let mut classifier = StubClassifier::new();
        let run = run_analysis(
            &mut session,
            &mut source,
            &mut classifier,
            &options(5),
            &mut NoopObserver,
        )
        .unwrap();
        assert!(run.is_none());
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn stub_run_records_every_frame() {
        let mut session = AnalysisSession::new();
        session.load_video("stub://clip");
        let mut source = FileSource::new(FileConfig::new("stub://clip")).unwrap();
        let mut classifier = StubClassifier::new();
        let run = run_analysis(
            &mut session,
            &mut source,
            &mut classifier,
            &options(5),
            &mut NoopObserver,
        )
        .unwrap()
        .unwrap();

        assert_eq!(run.sampled, 5);
        assert_eq!(run.recorded, 5);
        assert!(run.skipped.is_empty());
        assert_eq!(classifier.calls(), 4);
        assert!(session
            .results()
            .iter()
            .all(|r| r.classification == TransitionLabel::Normal));
    }

    #[test]
    fn preview_fills_gallery() {
        let mut session = AnalysisSession::new();
        let mut source = FileSource::new(FileConfig::new("stub://clip")).unwrap();
        assert_eq!(
            run_preview(&mut session, &mut source, 12, options(12).sampler).unwrap(),
            None
        );

        session.load_video("stub://clip");
        let captured = run_preview(&mut session, &mut source, 12, options(12).sampler)
            .unwrap()
            .unwrap();
        assert_eq!(captured, 12);
        assert_eq!(session.preview().len(), 12);
    }
}
