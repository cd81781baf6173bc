//! Temporal Vision
//!
//! Frame-drop and frame-merge analysis for sports video.
//!
//! # Architecture
//!
//! A single analysis pass is strictly sequential:
//!
//! 1. **Sample**: evenly spaced timestamps are read from a seekable source.
//! 2. **Classify**: each frame is compared with the frame sampled before it
//!    by a pluggable classifier backend (Gemini or a local stub).
//! 3. **Accumulate**: validated verdicts are appended to the session in frame
//!    order. Failed pairs are skipped, never retried.
//! 4. **Report**: summary counts, a confidence timeline and the ball
//!    trajectory are derived from the accumulated results.
//!
//! # Module Structure
//!
//! - `frame`: Encoded still images and their timestamps
//! - `ingest`: Video sources (local files, synthetic clips) and the frame sampler
//! - `classify`: Pair classifier trait, verdict validation, backends, registry
//! - `session`: Per-video state, phases and progress
//! - `analysis`: The sample -> classify -> accumulate loop and preview sampling
//! - `report`: Derived views and renderings
//! - `config`: File and environment configuration
//! - `ui`: Terminal progress presentation

pub mod analysis;
pub mod classify;
pub mod config;
pub mod frame;
pub mod ingest;
pub mod report;
pub mod session;
pub mod ui;

pub use analysis::{
    run_analysis, run_preview, AnalysisObserver, AnalysisOptions, AnalysisRun, FrameOutcome,
    NoopObserver,
};
pub use classify::{
    BallTracking, ClassificationError, ClassifierRegistry, ClassifierVerdict, PairClassifier,
    TransitionLabel,
};
pub use config::AnalyzerConfig;
pub use frame::{EncodedImage, Frame};
pub use ingest::{FileConfig, FileSource, FrameSampler, SamplerOptions, VideoMetadata, VideoSource};
pub use report::{AnalysisReport, Summary};
pub use session::{AnalysisSession, ClassificationResult, Progress, SessionPhase};
