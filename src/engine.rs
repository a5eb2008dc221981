//! The engine facade: owns the decision policy and the per-subject session
//! registry, and drives the tick loops against the injected capabilities.
//!
//! One logical session runs as a cooperative loop: pull the latest frame,
//! extract, advance the session, sleep out the tick. The caller can cancel
//! at any tick boundary through a [`CancelHandle`]; the loop reaches a
//! terminal state within one tick and releases its frame history.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::DecisionPolicy;
use crate::enroll::{CaptureStep, EnrollmentSession};
use crate::error::{EnrollmentError, PolicyError, VerificationError};
use crate::events::{EnrollmentObserver, VerificationObserver};
use crate::extractor::{DescriptorExtractor, FrameSource};
use crate::template::EnrollmentTemplate;
use crate::types::SubjectId;
use crate::verify::{VerificationOutcome, VerificationSession};

/// Caller-held cancellation flag, shared with an in-flight session.
/// Cancelling an already-finished session is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct FaceGate {
    policy: DecisionPolicy,
    active: Mutex<HashSet<SubjectId>>,
}

impl FaceGate {
    pub fn new(policy: DecisionPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            policy,
            active: Mutex::new(HashSet::new()),
        })
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Capture a fresh enrollment template for `subject`. The finished
    /// template is returned by value; persisting it is the caller's job.
    pub fn enroll<S, X>(
        &self,
        subject: SubjectId,
        source: &mut S,
        extractor: &mut X,
        observer: &mut dyn EnrollmentObserver,
        cancel: &CancelHandle,
    ) -> Result<EnrollmentTemplate, EnrollmentError>
    where
        S: FrameSource,
        X: DescriptorExtractor<Frame = S::Frame>,
    {
        tracing::info!(subject = %subject, "starting enrollment");
        let mut session = EnrollmentSession::new(&self.policy, subject);
        let deadline = self.policy.enrollment_timeout();
        let started = Instant::now();

        let result = loop {
            if session.is_complete() {
                break session.finish(extractor.model_version());
            }
            if cancel.is_cancelled() || started.elapsed() >= deadline {
                break Err(EnrollmentError::InsufficientSamples {
                    collected: session.collected(),
                    required: self.policy.min_enrollment_samples,
                });
            }
            let Some(frame) = source.next_frame() else {
                break Err(EnrollmentError::InsufficientSamples {
                    collected: session.collected(),
                    required: self.policy.min_enrollment_samples,
                });
            };
            let detections = match extractor.extract(&frame) {
                Ok(d) => d,
                Err(e) => break Err(EnrollmentError::Extractor(e)),
            };

            match session.step(&detections, Instant::now()) {
                Ok(CaptureStep::Accepted { angle, quality }) => {
                    observer.on_sample_accepted(angle, quality);
                    let angle_now = session.current_angle().unwrap_or(angle);
                    observer.on_progress(angle_now, session.progress());
                }
                Ok(_) => {}
                Err(e) => break Err(e),
            }

            std::thread::sleep(self.policy.sample_tick_interval());
        };

        match &result {
            Ok(template) => observer.on_complete(template),
            Err(e) => {
                tracing::warn!(error = %e, "enrollment failed");
                observer.on_error(e);
            }
        }
        result
    }

    /// Run one verification session against a previously stored template.
    /// At most one session per subject may be in flight; a second start is
    /// rejected rather than letting two sessions interleave their frame
    /// histories.
    pub fn verify<S, X>(
        &self,
        subject: SubjectId,
        template: &EnrollmentTemplate,
        source: &mut S,
        extractor: &mut X,
        observer: &mut dyn VerificationObserver,
        cancel: &CancelHandle,
    ) -> Result<VerificationOutcome, VerificationError>
    where
        S: FrameSource,
        X: DescriptorExtractor<Frame = S::Frame>,
    {
        let _guard = self.register(subject.clone())?;
        tracing::info!(subject = %subject, "starting verification session");

        let mut session = VerificationSession::new(&self.policy, template);
        session.start(Instant::now());

        while !session.is_terminal() {
            if cancel.is_cancelled() {
                session.cancel();
                break;
            }
            let Some(frame) = source.next_frame() else {
                // Capture ended under us; treat like a cancellation.
                session.cancel();
                break;
            };
            let detections = match extractor.extract(&frame) {
                Ok(d) => d,
                Err(e) => return Err(VerificationError::Extractor(e)),
            };

            let report = session.step(detections, Instant::now());
            observer.on_progress(report.progress);
            if report.state.is_terminal() {
                break;
            }

            std::thread::sleep(self.policy.sample_tick_interval());
        }

        // Terminal in every path out of the loop.
        let outcome = session
            .outcome()
            .cloned()
            .unwrap_or(VerificationOutcome::TimedOut);
        match &outcome {
            VerificationOutcome::Authorized { confidence } => observer.on_success(*confidence),
            other => observer.on_failure(other),
        }
        Ok(outcome)
    }

    fn register(&self, subject: SubjectId) -> Result<ActiveGuard<'_>, VerificationError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(subject.clone()) {
            tracing::warn!(subject = %subject, "rejected concurrent verification start");
            return Err(VerificationError::SessionActive(subject));
        }
        Ok(ActiveGuard {
            registry: &self.active,
            subject,
        })
    }
}

/// Removes the subject from the active set on every exit path.
struct ActiveGuard<'a> {
    registry: &'a Mutex<HashSet<SubjectId>>,
    subject: SubjectId,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.subject);
    }
}
