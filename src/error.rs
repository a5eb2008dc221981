use thiserror::Error;

use crate::types::SubjectId;

/// Failures of the injected descriptor-extraction capability. These are
/// fatal for the session that hit them; the engine never retries a broken
/// model.
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("extractor unavailable: {0}")]
    Unavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Terminal enrollment outcomes. Per-sample problems (pose mismatch, low
/// quality) are absorbed by the capture loop and never surface here.
#[derive(Error, Debug)]
pub enum EnrollmentError {
    /// No detection at all for the configured consecutive-miss cap.
    #[error("no face detected for {misses} consecutive frames")]
    NoFaceDetected { misses: u32 },

    /// The session was aborted (timeout, cancellation, or exhausted frame
    /// source) before the minimum sample count was reached. Enrollment has
    /// no partial resume; the caller restarts from scratch.
    #[error("insufficient samples: collected {collected} of {required}")]
    InsufficientSamples { collected: usize, required: usize },

    #[error("extractor error: {0}")]
    Extractor(#[from] ExtractorError),
}

/// Errors that prevent a verification session from running at all. The
/// Authorized / Denied / TimedOut outcomes are not errors; see
/// [`crate::verify::VerificationOutcome`].
#[derive(Error, Debug)]
pub enum VerificationError {
    /// Another session is already active for this subject. Frame histories
    /// are never shared or interleaved across sessions.
    #[error("a verification session is already active for subject {0}")]
    SessionActive(SubjectId),

    #[error("extractor error: {0}")]
    Extractor(#[from] ExtractorError),
}

/// Policy configuration problems, raised at load/validation time.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("policy parse error: {0}")]
    Parse(String),

    #[error("invalid policy: {0}")]
    Invalid(String),
}
