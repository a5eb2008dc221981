//! Progress and outcome callbacks. A UI can render "capturing angle 2 of 3"
//! or "verifying..." from these without inspecting engine internals. All
//! methods default to no-ops so callers implement only what they show.

use crate::error::EnrollmentError;
use crate::template::EnrollmentTemplate;
use crate::types::FaceAngle;
use crate::verify::VerificationOutcome;

pub trait EnrollmentObserver {
    /// Called after every accepted sample with the angle currently being
    /// captured and overall completion in [0, 100].
    fn on_progress(&mut self, _angle: FaceAngle, _percent: f32) {}

    fn on_sample_accepted(&mut self, _angle: FaceAngle, _quality: f32) {}

    fn on_complete(&mut self, _template: &EnrollmentTemplate) {}

    fn on_error(&mut self, _error: &EnrollmentError) {}
}

pub trait VerificationObserver {
    /// Completion estimate in [0, 100], driven by attempt and time budgets.
    fn on_progress(&mut self, _percent: f32) {}

    fn on_success(&mut self, _confidence: f32) {}

    fn on_failure(&mut self, _outcome: &VerificationOutcome) {}
}

/// Observer that ignores everything, for headless callers and tests.
#[derive(Debug, Default)]
pub struct NullObserver;

impl EnrollmentObserver for NullObserver {}
impl VerificationObserver for NullObserver {}
