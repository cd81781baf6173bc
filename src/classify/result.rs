use serde::{Deserialize, Serialize};

use super::error::ClassificationError;

/// Temporal consistency of a frame relative to its predecessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionLabel {
    #[serde(rename = "Normal")]
    Normal,
    /// Intermediate frames appear to be missing.
    #[serde(rename = "Frame Drop")]
    FrameDrop,
    /// Several moments appear blended into one frame.
    #[serde(rename = "Frame Merge")]
    FrameMerge,
}

impl TransitionLabel {
    pub const ALL: [TransitionLabel; 3] = [Self::Normal, Self::FrameDrop, Self::FrameMerge];

    /// Wire/display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FrameDrop => "Frame Drop",
            Self::FrameMerge => "Frame Merge",
        }
    }
}

impl std::fmt::Display for TransitionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ball localization (normalized 0..1 coordinates).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallTracking {
    pub is_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl BallTracking {
    pub fn not_detected() -> Self {
        Self::default()
    }

    pub fn detected_at(x: f64, y: f64) -> Self {
        Self {
            is_detected: true,
            x: Some(x),
            y: Some(y),
        }
    }

    /// Both coordinates, when the ball was detected and located.
    pub fn position(&self) -> Option<(f64, f64)> {
        if !self.is_detected {
            return None;
        }
        Some((self.x?, self.y?))
    }

    fn validate(&self) -> Result<(), ClassificationError> {
        match (self.is_detected, self.x, self.y) {
            (false, None, None) => Ok(()),
            (false, _, _) => Err(ClassificationError::Schema(
                "ball coordinates present while isDetected is false".to_string(),
            )),
            (true, None, None) => Ok(()),
            (true, Some(x), Some(y)) => {
                check_unit_interval("ballTracking.x", x)?;
                check_unit_interval("ballTracking.y", y)
            }
            (true, _, _) => Err(ClassificationError::Schema(
                "ball coordinates must be given as an x/y pair".to_string(),
            )),
        }
    }
}

/// Structured model response for one frame pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierVerdict {
    pub classification: TransitionLabel,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_tracking: Option<BallTracking>,
}

impl ClassifierVerdict {
    /// Enforce the output contract. Out-of-range values are rejected, never clamped.
    pub fn validate(self) -> Result<Self, ClassificationError> {
        check_unit_interval("confidence", self.confidence)?;
        if let Some(ball) = &self.ball_tracking {
            ball.validate()?;
        }
        Ok(self)
    }
}

fn check_unit_interval(field: &str, value: f64) -> Result<(), ClassificationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ClassificationError::Schema(format!(
            "{} must be within [0, 1], got {}",
            field, value
        )))
    }
}
