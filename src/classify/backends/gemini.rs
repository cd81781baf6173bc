//! Gemini `generateContent` backend.
//!
//! Each call sends the analyst prompt, both frames as inline JPEG parts and a
//! response schema mirroring `ClassifierVerdict`. The first candidate's text
//! is parsed as JSON and validated before it is returned.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::classify::backend::{check_frame_index, PairClassifier};
use crate::classify::error::ClassificationError;
use crate::classify::result::ClassifierVerdict;
use crate::frame::Frame;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_ERROR_BODY_CHARS: usize = 300;

const ANALYST_PROMPT: &str = "You are a video motion analyst. Compare the previous and the current \
frame of a video and decide whether the transition between them is temporally consistent.

Labels:
- Frame Drop: one or more frames are missing. Motion or scene content jumps abruptly; objects \
appear to skip positions instead of moving smoothly.
- Frame Merge: several moments are blended into one frame. Objects look smeared, doubled or \
ghosted, as if two points in time overlap.
- Normal: the transition is smooth and consistent with the expected motion.

Also look for a ball in the current frame. If you find one, set ballTracking.isDetected to true \
and give the centre of the ball as x and y, normalized to 0..1 from the top-left corner. If there \
is no ball, set isDetected to false and omit x and y.

Give a confidence between 0.0 and 1.0 and a detailed reasoning for the label.";

/// Connection settings for the Gemini backend.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct GeminiClassifier {
    config: GeminiConfig,
    agent: ureq::Agent,
}

impl GeminiClassifier {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(anyhow!("gemini backend requires an API key"));
        }
        if config.model.trim().is_empty() {
            return Err(anyhow!("gemini backend requires a model name"));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();
        Ok(Self { config, agent })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl PairClassifier for GeminiClassifier {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn classify_pair(
        &mut self,
        previous: &Frame,
        current: &Frame,
        frame_index: u32,
    ) -> Result<ClassifierVerdict, ClassificationError> {
        check_frame_index(frame_index)?;
        let body = build_request(previous, current, frame_index);

        log::debug!(
            "gemini: classifying frame {} ({} + {} bytes)",
            frame_index,
            previous.image().bytes().len(),
            current.image().bytes().len()
        );

        let response = match self
            .agent
            .post(&self.url())
            .set("x-goog-api-key", &self.config.api_key)
            .send_json(body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_string()
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_ERROR_BODY_CHARS)
                    .collect();
                return Err(ClassificationError::Api { status, message });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(ClassificationError::Transport(transport.to_string()));
            }
        };

        parse_response(read_envelope(response)?)
    }
}

/// Decode the response envelope. A body that arrives but does not match the
/// envelope is a schema error; a body that cannot be read is a transport one.
pub(crate) fn read_envelope(
    response: ureq::Response,
) -> Result<GenerateContentResponse, ClassificationError> {
    response.into_json().map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            ClassificationError::Schema(format!("response envelope: {}", e))
        }
        _ => ClassificationError::Transport(format!("read response body: {}", e)),
    })
}

/// Request body for one frame pair.
pub(crate) fn build_request(previous: &Frame, current: &Frame, frame_index: u32) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": ANALYST_PROMPT },
                { "text": format!("Classify the current frame (frame number: {}) relative to the previous frame.", frame_index) },
                { "text": "Previous Frame:" },
                { "inlineData": {
                    "mimeType": previous.image().mime_type(),
                    "data": previous.image().to_base64(),
                } },
                { "text": "Current Frame:" },
                { "inlineData": {
                    "mimeType": current.image().mime_type(),
                    "data": current.image().to_base64(),
                } },
            ],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        },
    })
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "classification": {
                "type": "STRING",
                "enum": ["Normal", "Frame Drop", "Frame Merge"],
            },
            "confidence": { "type": "NUMBER", "minimum": 0.0, "maximum": 1.0 },
            "reasoning": { "type": "STRING" },
            "ballTracking": {
                "type": "OBJECT",
                "properties": {
                    "isDetected": { "type": "BOOLEAN" },
                    "x": { "type": "NUMBER", "minimum": 0.0, "maximum": 1.0 },
                    "y": { "type": "NUMBER", "minimum": 0.0, "maximum": 1.0 },
                },
                "required": ["isDetected"],
            },
        },
        "required": ["classification", "confidence", "reasoning"],
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub(crate) fn parse_response(
    response: GenerateContentResponse,
) -> Result<ClassifierVerdict, ClassificationError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ClassificationError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let payload = strip_code_fence(&text);
    if payload.is_empty() {
        if let Some(reason) = candidate.finish_reason {
            log::debug!("gemini: empty candidate, finishReason={}", reason);
        }
        return Err(ClassificationError::EmptyResponse);
    }

    let verdict: ClassifierVerdict = serde_json::from_str(payload)?;
    verdict.validate()
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
