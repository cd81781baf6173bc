use crate::frame::Frame;

use super::error::ClassificationError;
use super::result::ClassifierVerdict;

/// Frame-pair classifier backend.
///
/// One call classifies `current` relative to `previous`. Calls are issued
/// strictly in ascending frame order and never overlap. Implementations must
/// return a verdict that passes `ClassifierVerdict::validate`.
pub trait PairClassifier {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Classify the transition into frame `frame_index`.
    ///
    /// `frame_index` is at least 1; frame 0 is the baseline and is never sent.
    fn classify_pair(
        &mut self,
        previous: &Frame,
        current: &Frame,
        frame_index: u32,
    ) -> Result<ClassifierVerdict, ClassificationError>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<(), ClassificationError> {
        Ok(())
    }
}

/// Input check shared by all backends.
pub(crate) fn check_frame_index(frame_index: u32) -> Result<(), ClassificationError> {
    if frame_index == 0 {
        return Err(ClassificationError::InvalidInput(
            "frame 0 is the baseline and has no predecessor".to_string(),
        ));
    }
    Ok(())
}
