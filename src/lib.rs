//! Biometric enrollment and continuous face verification engine.
//!
//! Captures multi-angle facial samples into an enrollment template, then
//! verifies a live camera feed against that template under multi-signal
//! liveness checks and a progressive-confidence decision policy. Camera
//! access, the descriptor-extraction model, and template persistence are
//! all injected capabilities; this crate is the decision core only.

pub mod config;
pub mod engine;
pub mod enroll;
pub mod error;
pub mod events;
pub mod extractor;
pub mod history;
pub mod liveness;
pub mod pose;
pub mod quality;
pub mod template;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the public surface.
pub use config::DecisionPolicy;
pub use engine::{CancelHandle, FaceGate};
pub use error::{EnrollmentError, ExtractorError, PolicyError, VerificationError};
pub use events::{EnrollmentObserver, NullObserver, VerificationObserver};
pub use extractor::{DescriptorExtractor, FrameSource};
pub use liveness::LivenessResult;
pub use template::{EnrollmentSample, EnrollmentTemplate};
pub use types::{
    BoundingBox, Descriptor, Detection, FaceAngle, Point2D, PoseEstimate, SubjectId,
};
pub use verify::{DenialReason, SessionState, VerificationOutcome, VerificationSession};
