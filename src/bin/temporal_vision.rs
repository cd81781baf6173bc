//! temporal_vision - frame-drop / frame-merge analysis for sports video.
//!
//! `analyze` samples evenly spaced frames, classifies each consecutive pair
//! and prints a summary. `preview` only samples the gallery frames.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use temporal_vision::classify::{GeminiClassifier, StubClassifier};
use temporal_vision::report::{render_text, AnalysisReport};
use temporal_vision::ui::Ui;
use temporal_vision::{
    run_analysis, run_preview, AnalysisSession, AnalyzerConfig, ClassifierRegistry, EncodedImage,
    FileConfig, FileSource,
};

#[derive(Parser, Debug)]
#[command(name = "temporal_vision", version, about = "Detect dropped and merged frames in video")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify consecutive sampled frames.
    Analyze {
        /// Video file path (or stub://name for a synthetic clip)
        video: String,
        /// Number of frames to sample (overrides config)
        #[arg(long)]
        frames: Option<usize>,
        /// Classifier backend (gemini|stub, overrides config)
        #[arg(long)]
        backend: Option<String>,
        /// Write the JSON report to PATH
        #[arg(long, value_name = "PATH")]
        report: Option<String>,
        /// Write each recorded frame as JPEG into DIR
        #[arg(long, value_name = "DIR")]
        frames_dir: Option<String>,
        /// UI mode for stderr progress (auto|plain|pretty)
        #[arg(long, env = "TEMPORAL_VISION_UI", default_value = "auto", value_name = "MODE")]
        ui: String,
    },
    /// Sample the preview gallery.
    Preview {
        /// Video file path (or stub://name for a synthetic clip)
        video: String,
        /// Output directory for preview JPEGs
        #[arg(long, value_name = "DIR")]
        out: String,
        /// Number of preview frames (overrides config)
        #[arg(long)]
        count: Option<usize>,
        /// UI mode for stderr progress (auto|plain|pretty)
        #[arg(long, env = "TEMPORAL_VISION_UI", default_value = "auto", value_name = "MODE")]
        ui: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AnalyzerConfig::load()?;
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();

    match args.command {
        Command::Analyze {
            video,
            frames,
            backend,
            report,
            frames_dir,
            ui,
        } => {
            let ui = Ui::from_args(Some(&ui), is_tty, !stdout_is_tty);
            let mut options = config.analysis_options();
            if let Some(frames) = frames {
                if frames == 0 {
                    return Err(anyhow!("--frames must be >= 1"));
                }
                options.frame_count = frames;
            }
            let backend = backend
                .map(|name| name.trim().to_lowercase())
                .unwrap_or_else(|| config.classifier.backend.clone());

            let mut registry = build_registry(&config)?;
            registry.set_default(&backend).map_err(|e| {
                if backend == "gemini" {
                    anyhow!("{e}; set GEMINI_API_KEY or TEMPORAL_VISION_API_KEY")
                } else {
                    e
                }
            })?;

            let mut source = {
                let _stage = ui.stage("Open video");
                FileSource::new(FileConfig::new(video.clone()))?
            };
            let mut session = AnalysisSession::new();
            session.load_video(video);

            let classifier = registry
                .default_backend_mut()
                .ok_or_else(|| anyhow!("no classifier backend registered"))?;
            let mut observer = ui.analysis_progress();
            let run = run_analysis(
                &mut session,
                &mut source,
                classifier,
                &options,
                &mut observer,
            )?;
            if run.is_none() {
                return Err(anyhow!("analysis did not start"));
            }

            let report_data = AnalysisReport::from_session(&session);
            if let Some(path) = report {
                let _stage = ui.stage("Write report");
                fs::write(&path, report_data.to_json_pretty()?)
                    .with_context(|| format!("failed to write report {path}"))?;
            }
            if let Some(dir) = frames_dir {
                let _stage = ui.stage("Write frames");
                let images = session
                    .results()
                    .iter()
                    .map(|result| (result.frame_index, &result.image));
                write_images(Path::new(&dir), images)?;
            }
            print!("{}", render_text(&report_data));
        }
        Command::Preview {
            video,
            out,
            count,
            ui,
        } => {
            let ui = Ui::from_args(Some(&ui), is_tty, !stdout_is_tty);
            let count = count.unwrap_or(config.sampling.preview_frames);
            if count == 0 {
                return Err(anyhow!("--count must be >= 1"));
            }
            let mut source = FileSource::new(FileConfig::new(video.clone()))?;
            let mut session = AnalysisSession::new();
            session.load_video(video);

            let captured = {
                let _stage = ui.stage("Sample preview frames");
                run_preview(&mut session, &mut source, count, config.sampler_options())?
                    .unwrap_or(0)
            };
            let images = session
                .preview()
                .iter()
                .enumerate()
                .map(|(i, frame)| (i as u32, frame.image()));
            write_images(Path::new(&out), images)?;
            for (i, frame) in session.preview().iter().enumerate() {
                println!("#{:<3} {}s", i, frame.timestamp_label());
            }
            println!("preview: {} frames written to {}", captured, out);
        }
    }
    Ok(())
}

/// The stub backend is always available; Gemini needs an API key.
fn build_registry(config: &AnalyzerConfig) -> Result<ClassifierRegistry> {
    let mut registry = ClassifierRegistry::new();
    registry.register(StubClassifier::new());
    match config.gemini() {
        Some(gemini) => registry.register(GeminiClassifier::new(gemini)?),
        None => log::debug!("gemini backend unavailable: no API key configured"),
    }
    Ok(registry)
}

fn write_images<'a>(
    dir: &Path,
    images: impl Iterator<Item = (u32, &'a EncodedImage)>,
) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    for (index, image) in images {
        if image.is_empty() {
            log::warn!("frame {} has no image data, not written", index);
            continue;
        }
        let path = dir.join(format!("frame_{:03}.jpg", index));
        fs::write(&path, image.bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn ui_mode_falls_back_to_environment() {
        std::env::set_var("TEMPORAL_VISION_UI", "plain");
        let args = Args::try_parse_from(["temporal_vision", "analyze", "stub://clip"]).unwrap();
        let explicit = Args::try_parse_from([
            "temporal_vision",
            "preview",
            "stub://clip",
            "--out",
            "frames",
            "--ui",
            "pretty",
        ])
        .unwrap();
        std::env::remove_var("TEMPORAL_VISION_UI");

        match args.command {
            Command::Analyze { ui, .. } => assert_eq!(ui, "plain"),
            other => panic!("unexpected command {other:?}"),
        }
        match explicit.command {
            Command::Preview { ui, .. } => assert_eq!(ui, "pretty"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
