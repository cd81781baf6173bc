mod backend;
pub mod backends;
mod error;
mod registry;
mod result;

pub use backend::PairClassifier;
pub use backends::{GeminiClassifier, GeminiConfig, StubClassifier};
pub use error::ClassificationError;
pub use registry::ClassifierRegistry;
pub use result::{BallTracking, ClassifierVerdict, TransitionLabel};
