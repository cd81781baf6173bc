//! Analysis session state.
//!
//! `AnalysisSession` owns everything tied to one loaded video: the preview
//! gallery, the accumulated classification results and the progress counter.
//! Loading another video discards all of it. Nothing is persisted.
//!
//! Phases: `Idle -> Sampling -> Idle` (preview) and `Idle -> Analyzing -> Idle`.
//! Operations that need a loaded video, or that would start a second pass
//! while one is running, are no-ops.

use anyhow::{anyhow, Result};

use crate::classify::{BallTracking, ClassifierVerdict, TransitionLabel};
use crate::frame::{EncodedImage, Frame};

pub const BASELINE_REASONING: &str = "Baseline frame.";

/// Classification of one sampled frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    pub frame_index: u32,
    pub timestamp_secs: f64,
    pub classification: TransitionLabel,
    pub confidence: f64,
    pub reasoning: String,
    pub ball_tracking: Option<BallTracking>,
    /// Encoded frame, kept for the gallery export.
    pub image: EncodedImage,
}

impl ClassificationResult {
    /// Frame 0 has no predecessor and is reported as Normal with full confidence.
    pub fn baseline(frame: &Frame) -> Self {
        Self {
            frame_index: 0,
            timestamp_secs: frame.timestamp_secs,
            classification: TransitionLabel::Normal,
            confidence: 1.0,
            reasoning: BASELINE_REASONING.to_string(),
            ball_tracking: Some(BallTracking::not_detected()),
            image: frame.image().clone(),
        }
    }

    pub fn from_verdict(frame_index: u32, frame: &Frame, verdict: ClassifierVerdict) -> Self {
        Self {
            frame_index,
            timestamp_secs: frame.timestamp_secs,
            classification: verdict.classification,
            confidence: verdict.confidence,
            reasoning: verdict.reasoning,
            ball_tracking: verdict.ball_tracking,
            image: frame.image().clone(),
        }
    }

    pub fn ball_detected(&self) -> bool {
        self.ball_tracking.is_some_and(|ball| ball.is_detected)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Sampling,
    Analyzing,
}

/// Frames processed out of frames sampled for the current pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

#[derive(Debug)]
pub struct AnalysisSession {
    video: Option<String>,
    phase: SessionPhase,
    preview: Vec<Frame>,
    results: Vec<ClassificationResult>,
    progress: Progress,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            video: None,
            phase: SessionPhase::Idle,
            preview: Vec::new(),
            results: Vec::new(),
            progress: Progress::default(),
        }
    }

    /// Reset-on-upload: attach a new video and drop all derived state.
    pub fn load_video(&mut self, label: impl Into<String>) {
        let label = label.into();
        log::debug!("session: loading {}", label);
        self.video = Some(label);
        self.phase = SessionPhase::Idle;
        self.preview.clear();
        self.results.clear();
        self.progress = Progress::default();
    }

    pub fn video(&self) -> Option<&str> {
        self.video.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn preview(&self) -> &[Frame] {
        &self.preview
    }

    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// True when a video is loaded and no pass is running.
    pub fn can_begin(&self) -> bool {
        self.video.is_some() && self.phase == SessionPhase::Idle
    }

    /// Enter `Sampling`. Returns false (no-op) without a video or while busy.
    pub fn begin_sampling(&mut self) -> bool {
        if !self.can_start("preview sampling") {
            return false;
        }
        self.phase = SessionPhase::Sampling;
        true
    }

    /// Store the preview gallery and return to `Idle`.
    pub fn finish_sampling(&mut self, frames: Vec<Frame>) {
        if self.phase != SessionPhase::Sampling {
            log::debug!("session: finish_sampling ignored in {:?}", self.phase);
            return;
        }
        self.preview = frames;
        self.phase = SessionPhase::Idle;
    }

    /// Enter `Analyzing` with `total_frames` planned. Clears earlier results.
    /// Returns false (no-op) without a video or while busy.
    pub fn begin_analysis(&mut self, total_frames: usize) -> bool {
        if !self.can_start("analysis") {
            return false;
        }
        self.phase = SessionPhase::Analyzing;
        self.results.clear();
        self.progress = Progress {
            completed: 0,
            total: total_frames,
        };
        true
    }

    /// Append a result. Frame indices must be strictly increasing.
    pub fn append_result(&mut self, result: ClassificationResult) -> Result<()> {
        if self.phase != SessionPhase::Analyzing {
            return Err(anyhow!("cannot append results while {:?}", self.phase));
        }
        if let Some(last) = self.results.last() {
            if result.frame_index <= last.frame_index {
                return Err(anyhow!(
                    "frame {} arrived after frame {}",
                    result.frame_index,
                    last.frame_index
                ));
            }
        }
        self.results.push(result);
        Ok(())
    }

    pub fn set_progress(&mut self, completed: usize) -> Result<()> {
        if self.phase != SessionPhase::Analyzing {
            return Err(anyhow!("cannot record progress while {:?}", self.phase));
        }
        if completed > self.progress.total {
            return Err(anyhow!(
                "progress {} exceeds planned total {}",
                completed,
                self.progress.total
            ));
        }
        self.progress.completed = completed;
        Ok(())
    }

    pub fn finish_analysis(&mut self) {
        if self.phase == SessionPhase::Analyzing {
            self.phase = SessionPhase::Idle;
        }
    }

    fn can_start(&self, what: &str) -> bool {
        if self.video.is_none() {
            log::debug!("session: {} ignored, no video loaded", what);
            return false;
        }
        if self.phase != SessionPhase::Idle {
            log::debug!("session: {} ignored while {:?}", what, self.phase);
            return false;
        }
        true
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(t: f64) -> Frame {
        Frame::new(t, EncodedImage::from_jpeg_bytes(vec![t as u8]))
    }

    fn result(index: u32) -> ClassificationResult {
        ClassificationResult::from_verdict(
            index,
            &frame(index as f64),
            ClassifierVerdict {
                classification: TransitionLabel::FrameDrop,
                confidence: 0.6,
                reasoning: "jump".to_string(),
                ball_tracking: None,
            },
        )
    }

    #[test]
    fn baseline_is_normal_with_full_confidence() {
        let baseline = ClassificationResult::baseline(&frame(0.0));
        assert_eq!(baseline.frame_index, 0);
        assert_eq!(baseline.classification, TransitionLabel::Normal);
        assert_eq!(baseline.confidence, 1.0);
        assert_eq!(baseline.reasoning, BASELINE_REASONING);
        assert!(!baseline.ball_detected());
    }

    #[test]
    fn operations_without_video_are_noops() {
        let mut session = AnalysisSession::new();
        assert!(!session.begin_sampling());
        assert!(!session.begin_analysis(10));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.append_result(result(1)).is_err());
    }

    #[test]
    fn analysis_accumulates_in_frame_order() {
        let mut session = AnalysisSession::new();
        session.load_video("clip.mp4");
        assert!(session.begin_analysis(4));
        assert!(!session.begin_analysis(4), "second run while analyzing");

        session
            .append_result(ClassificationResult::baseline(&frame(0.0)))
            .unwrap();
        session.set_progress(1).unwrap();
        session.append_result(result(2)).unwrap();
        assert!(session.append_result(result(2)).is_err());
        assert!(session.append_result(result(1)).is_err());
        session.set_progress(4).unwrap();
        assert!(session.set_progress(5).is_err());

        session.finish_analysis();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.results().len(), 2);
        assert!(session.progress().is_complete());
        assert_eq!(session.progress().percent(), 100.0);
    }

    #[test]
    fn loading_a_video_resets_state() {
        let mut session = AnalysisSession::new();
        session.load_video("a.mp4");
        assert!(session.begin_sampling());
        session.finish_sampling(vec![frame(0.0), frame(1.0)]);
        assert!(session.begin_analysis(2));
        session.append_result(result(1)).unwrap();
        session.set_progress(1).unwrap();

        session.load_video("b.mp4");
        assert_eq!(session.video(), Some("b.mp4"));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.preview().is_empty());
        assert!(session.results().is_empty());
        assert_eq!(session.progress(), Progress::default());
    }

    #[test]
    fn preview_sampling_round_trip() {
        let mut session = AnalysisSession::new();
        session.load_video("a.mp4");
        assert!(session.begin_sampling());
        assert!(!session.begin_analysis(3), "busy while sampling");
        session.finish_sampling(vec![frame(0.0)]);
        assert_eq!(session.preview().len(), 1);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn progress_fraction_handles_empty_plan() {
        let progress = Progress::default();
        assert_eq!(progress.fraction(), 0.0);
        assert!(!progress.is_complete());
        let half = Progress {
            completed: 5,
            total: 10,
        };
        assert_eq!(half.percent(), 50.0);
    }
}
