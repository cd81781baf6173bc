use thiserror::Error;

/// Failure of a single frame-pair classification.
///
/// The analysis loop logs these and omits the frame; none of them is fatal.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("request rejected before sending: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("model endpoint returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned no structured output")]
    EmptyResponse,

    #[error("response violates output schema: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for ClassificationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Schema(err.to_string())
    }
}
