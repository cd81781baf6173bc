use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use crate::analysis::{AnalysisObserver, FrameOutcome};
use crate::session::Progress;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty, disable_pretty)
    }

    fn use_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.use_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

    /// Observer that reports per-frame progress for an analysis pass.
    pub fn analysis_progress(&self) -> ProgressObserver {
        ProgressObserver {
            pretty: self.use_pretty(),
            bar: None,
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", self.name, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

pub struct ProgressObserver {
    pretty: bool,
    bar: Option<ProgressBar>,
}

impl AnalysisObserver for ProgressObserver {
    fn on_plan(&mut self, total_frames: usize) {
        if total_frames == 0 {
            eprintln!("no frames to analyze");
            return;
        }
        if self.pretty {
            let bar = ProgressBar::new(total_frames as u64);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template("{bar:30} {pos}/{len} {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            self.bar = Some(bar);
        }
    }

    fn on_frame(&mut self, progress: Progress, outcome: &FrameOutcome) {
        let message = outcome_message(outcome);
        match &self.bar {
            Some(bar) => {
                bar.set_position(progress.completed as u64);
                bar.set_message(message);
                if progress.is_complete() {
                    bar.finish();
                }
            }
            None => eprintln!(
                "[{:>3.0}%] {}/{} {}",
                progress.percent(),
                progress.completed,
                progress.total,
                message
            ),
        }
    }
}

fn outcome_message(outcome: &FrameOutcome) -> String {
    match outcome {
        FrameOutcome::Recorded(result) => format!(
            "frame {}: {} ({:.0}%)",
            result.frame_index,
            result.classification,
            result.confidence * 100.0
        ),
        FrameOutcome::Skipped { frame_index, .. } => format!("frame {}: skipped", frame_index),
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationError;

    #[test]
    fn ui_flag_selects_mode() {
        assert!(!Ui::from_args(Some("plain"), true, false).use_pretty());
        assert!(Ui::from_args(Some("pretty"), true, true).use_pretty());
        assert!(!Ui::from_args(None, true, true).use_pretty());
        assert!(!Ui::from_args(Some("pretty"), false, false).use_pretty());
    }

    #[test]
    fn skipped_outcome_message() {
        let outcome = FrameOutcome::Skipped {
            frame_index: 3,
            timestamp_secs: 1.5,
            error: ClassificationError::EmptyResponse,
        };
        assert_eq!(outcome_message(&outcome), "frame 3: skipped");
    }

    #[test]
    fn durations_format_by_magnitude() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
