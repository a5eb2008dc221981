//! Injected capabilities. The engine never owns a camera or a model: it
//! pulls frames from a [`FrameSource`] and hands them to a
//! [`DescriptorExtractor`], both constructed and torn down by the caller.
//! Swapping either for a test double is the intended way to exercise the
//! engine without hardware.

use crate::error::ExtractorError;
use crate::types::Detection;

/// Supplies frames from a live capture device. Implementations should
/// return the latest available frame rather than blocking indefinitely;
/// `None` means capture has ended and the active session will wind down.
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Option<Self::Frame>;
}

/// The face detection + descriptor extraction model, treated as a black
/// box. May return several detections for a crowded frame; the engine
/// only ever considers the highest-confidence one.
pub trait DescriptorExtractor {
    type Frame;

    fn extract(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, ExtractorError>;

    /// Identifies the model that produced the descriptors, recorded on
    /// enrollment templates so stale templates can be detected after a
    /// model swap.
    fn model_version(&self) -> &str {
        "unknown"
    }
}
