pub mod gemini;
pub mod stub;

pub use gemini::{GeminiClassifier, GeminiConfig};
pub use stub::StubClassifier;
