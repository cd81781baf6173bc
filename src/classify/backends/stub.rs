use crate::classify::backend::{check_frame_index, PairClassifier};
use crate::classify::error::ClassificationError;
use crate::classify::result::{BallTracking, ClassifierVerdict, TransitionLabel};
use crate::frame::Frame;

/// Offline backend. Compares image fingerprints; never locates a ball.
#[derive(Default)]
pub struct StubClassifier {
    calls: u64,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl PairClassifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn classify_pair(
        &mut self,
        previous: &Frame,
        current: &Frame,
        frame_index: u32,
    ) -> Result<ClassifierVerdict, ClassificationError> {
        check_frame_index(frame_index)?;
        self.calls += 1;

        let identical = previous.image().fingerprint() == current.image().fingerprint();
        let (confidence, reasoning) = if identical {
            (1.0, "Frames are byte-identical; no motion to assess.")
        } else {
            (0.5, "Offline stub backend; transition not analysed.")
        };

        Ok(ClassifierVerdict {
            classification: TransitionLabel::Normal,
            confidence,
            reasoning: reasoning.to_string(),
            ball_tracking: Some(BallTracking::not_detected()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::EncodedImage;

    fn frame(t: f64, bytes: &[u8]) -> Frame {
        Frame::new(t, EncodedImage::from_jpeg_bytes(bytes.to_vec()))
    }

    #[test]
    fn stub_compares_fingerprints() {
        let mut backend = StubClassifier::new();

        let same = backend
            .classify_pair(&frame(0.0, b"a"), &frame(1.0, b"a"), 1)
            .unwrap();
        assert_eq!(same.classification, TransitionLabel::Normal);
        assert_eq!(same.confidence, 1.0);

        let changed = backend
            .classify_pair(&frame(1.0, b"a"), &frame(2.0, b"b"), 2)
            .unwrap();
        assert_eq!(changed.confidence, 0.5);
        assert!(changed.validate().is_ok());
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn stub_refuses_baseline_index() {
        let mut backend = StubClassifier::new();
        let err = backend
            .classify_pair(&frame(0.0, b"a"), &frame(0.0, b"a"), 0)
            .unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidInput(_)));
        assert_eq!(backend.calls(), 0);
    }
}
