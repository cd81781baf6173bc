//! Derived views over accumulated results: summary counts, confidence
//! timeline, ball trajectory, plus the JSON and terminal renderings.

use serde::Serialize;
use std::fmt::Write as _;

use crate::classify::{BallTracking, TransitionLabel};
use crate::frame::format_timestamp;
use crate::session::{AnalysisSession, ClassificationResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub normal: usize,
    pub drops: usize,
    pub merges: usize,
    pub ball_hits: usize,
}

impl Summary {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.classification {
                TransitionLabel::Normal => summary.normal += 1,
                TransitionLabel::FrameDrop => summary.drops += 1,
                TransitionLabel::FrameMerge => summary.merges += 1,
            }
            if result.ball_detected() {
                summary.ball_hits += 1;
            }
        }
        summary
    }

    /// Share of Normal frames, 0 when there are no results.
    pub fn normal_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.normal as f64 / self.total as f64
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConfidencePoint {
    pub frame: u32,
    /// Confidence scaled to 0..100.
    pub confidence: f64,
}

pub fn confidence_timeline(results: &[ClassificationResult]) -> Vec<ConfidencePoint> {
    results
        .iter()
        .map(|result| ConfidencePoint {
            frame: result.frame_index,
            confidence: result.confidence * 100.0,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub frame: u32,
    pub x: f64,
    pub y: f64,
}

/// Located detections in frame order.
pub fn trajectory(results: &[ClassificationResult]) -> Vec<TrajectoryPoint> {
    results
        .iter()
        .filter_map(|result| {
            let (x, y) = result.ball_tracking?.position()?;
            Some(TrajectoryPoint {
                frame: result.frame_index,
                x,
                y,
            })
        })
        .collect()
}

/// Line segments joining consecutive trajectory points.
pub fn trajectory_segments(points: &[TrajectoryPoint]) -> Vec<(TrajectoryPoint, TrajectoryPoint)> {
    points.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEntry {
    pub frame_number: u32,
    pub timestamp: String,
    pub classification: TransitionLabel,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ball_tracking: Option<BallTracking>,
    pub image_sha256: String,
}

impl From<&ClassificationResult> for FrameEntry {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            frame_number: result.frame_index,
            timestamp: format_timestamp(result.timestamp_secs),
            classification: result.classification,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
            ball_tracking: result.ball_tracking,
            image_sha256: result.image.fingerprint(),
        }
    }
}

/// Everything the presenter shows for one analysis pass.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub video: String,
    pub sampled_frames: usize,
    pub summary: Summary,
    pub frames: Vec<FrameEntry>,
    pub timeline: Vec<ConfidencePoint>,
    pub trajectory: Vec<TrajectoryPoint>,
}

impl AnalysisReport {
    pub fn from_session(session: &AnalysisSession) -> Self {
        let results = session.results();
        Self {
            video: session.video().unwrap_or_default().to_string(),
            sampled_frames: session.progress().total,
            summary: Summary::from_results(results),
            frames: results.iter().map(FrameEntry::from).collect(),
            timeline: confidence_timeline(results),
            trajectory: trajectory(results),
        }
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    let _ = writeln!(out, "Video:          {}", report.video);
    let _ = writeln!(
        out,
        "Frames:         {} recorded of {} sampled",
        s.total, report.sampled_frames
    );
    let _ = writeln!(
        out,
        "Normal:         {} ({:.0}%)",
        s.normal,
        s.normal_ratio() * 100.0
    );
    let _ = writeln!(out, "Frame drops:    {}", s.drops);
    let _ = writeln!(out, "Frame merges:   {}", s.merges);
    let _ = writeln!(out, "Ball tracked:   {}", s.ball_hits);

    if report.frames.is_empty() {
        let _ = writeln!(out, "\nNo frames analyzed.");
        return out;
    }

    let _ = writeln!(
        out,
        "\n{:>5}  {:>9}  {:<11}  {:>5}  {:<13}  reasoning",
        "frame", "time (s)", "label", "conf", "ball"
    );
    for frame in &report.frames {
        let ball = match frame.ball_tracking.and_then(|b| b.position()) {
            Some((x, y)) => format!("({:.2}, {:.2})", x, y),
            None if frame.ball_tracking.is_some_and(|b| b.is_detected) => "detected".to_string(),
            None => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:>5}  {:>9}  {:<11}  {:>4.0}%  {:<13}  {}",
            frame.frame_number,
            frame.timestamp,
            frame.classification.as_str(),
            frame.confidence * 100.0,
            ball,
            first_line(&frame.reasoning)
        );
    }

    if report.trajectory.len() > 1 {
        let path: Vec<String> = report
            .trajectory
            .iter()
            .map(|p| format!("#{}({:.2},{:.2})", p.frame, p.x, p.y))
            .collect();
        let _ = writeln!(out, "\nTrajectory: {}", path.join(" -> "));
    }
    out
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::EncodedImage;

    fn result(
        index: u32,
        label: TransitionLabel,
        confidence: f64,
        ball: Option<BallTracking>,
    ) -> ClassificationResult {
        ClassificationResult {
            frame_index: index,
            timestamp_secs: index as f64 * 0.5,
            classification: label,
            confidence,
            reasoning: format!("frame {index}\nmore detail"),
            ball_tracking: ball,
            image: EncodedImage::from_jpeg_bytes(vec![index as u8]),
        }
    }

    fn sample_results() -> Vec<ClassificationResult> {
        vec![
            result(0, TransitionLabel::Normal, 1.0, Some(BallTracking::not_detected())),
            result(1, TransitionLabel::FrameDrop, 0.8, Some(BallTracking::detected_at(0.2, 0.7))),
            result(
                2,
                TransitionLabel::Normal,
                0.6,
                Some(BallTracking {
                    is_detected: true,
                    x: None,
                    y: None,
                }),
            ),
            result(4, TransitionLabel::FrameMerge, 0.55, Some(BallTracking::detected_at(0.5, 0.4))),
            result(5, TransitionLabel::Normal, 0.9, None),
        ]
    }

    #[test]
    fn summary_counts_partition_total() {
        let summary = Summary::from_results(&sample_results());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.normal, 3);
        assert_eq!(summary.drops, 1);
        assert_eq!(summary.merges, 1);
        assert_eq!(summary.normal + summary.drops + summary.merges, summary.total);
        assert_eq!(summary.ball_hits, 3);
        assert_eq!(Summary::from_results(&[]).normal_ratio(), 0.0);
    }

    #[test]
    fn trajectory_keeps_only_located_detections() {
        let points = trajectory(&sample_results());
        assert_eq!(
            points,
            vec![
                TrajectoryPoint { frame: 1, x: 0.2, y: 0.7 },
                TrajectoryPoint { frame: 4, x: 0.5, y: 0.4 },
            ]
        );
        let segments = trajectory_segments(&points);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].0.frame, 1);
        assert_eq!(segments[0].1.frame, 4);
        assert!(trajectory_segments(&points[..1]).is_empty());
    }

    #[test]
    fn timeline_scales_confidence() {
        let timeline = confidence_timeline(&sample_results());
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline[0], ConfidencePoint { frame: 0, confidence: 100.0 });
        assert_eq!(timeline[3].frame, 4);
        assert!((timeline[3].confidence - 55.0).abs() < 1e-9);
    }

    #[test]
    fn report_serializes_wire_names() {
        let mut session = AnalysisSession::new();
        session.load_video("match.mp4");
        assert!(session.begin_analysis(6));
        for r in sample_results() {
            session.append_result(r).unwrap();
        }
        session.set_progress(6).unwrap();
        session.finish_analysis();

        let report = AnalysisReport::from_session(&session);
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["video"], "match.mp4");
        assert_eq!(json["sampledFrames"], 6);
        assert_eq!(json["summary"]["ballHits"], 3);
        assert_eq!(json["frames"][1]["classification"], "Frame Drop");
        assert_eq!(json["frames"][1]["timestamp"], "0.500");
        assert_eq!(json["frames"][1]["ballTracking"]["isDetected"], true);
        assert!(json["frames"][4].get("ballTracking").is_none());
        assert_eq!(json["trajectory"].as_array().unwrap().len(), 2);

        let text = render_text(&report);
        assert!(text.contains("Frame drops:    1"));
        assert!(text.contains("Frame Merge"));
        assert!(text.contains("(0.20, 0.70)"));
        assert!(text.contains("Trajectory: #1(0.20,0.70) -> #4(0.50,0.40)"));
        assert!(!text.contains("more detail"));
    }

    #[test]
    fn empty_report_renders_placeholder() {
        let session = AnalysisSession::new();
        let report = AnalysisReport::from_session(&session);
        assert!(render_text(&report).contains("No frames analyzed."));
    }
}
