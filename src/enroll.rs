//! Multi-angle enrollment capture.
//!
//! The session is tick-driven: the driver feeds it one frame's detections
//! at a time and it accepts or discards a sample per tick. Angles are
//! captured in a fixed order (front, left profile, right profile) with
//! per-angle quotas derived from the policy's total sample count. Rejected
//! samples cost nothing; only the consecutive-miss cap and the wall-clock
//! ceiling terminate a struggling session.

use std::time::Instant;

use crate::config::DecisionPolicy;
use crate::error::EnrollmentError;
use crate::pose;
use crate::quality::{descriptor_consistency, QualityMetrics};
use crate::template::{EnrollmentSample, EnrollmentTemplate};
use crate::types::{Detection, FaceAngle, SubjectId};

/// Why a frame was discarded. Absorbed locally; drivers may log these but
/// never surface them to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    LowConfidence,
    NoPose,
    PoseMismatch { expected: FaceAngle },
    FaceSizeOutOfBounds,
    LowQuality,
    TooSoon,
}

#[derive(Debug)]
pub enum CaptureStep {
    /// A sample was accepted toward `angle`.
    Accepted { angle: FaceAngle, quality: f32 },
    /// No detection in this frame.
    NoFace,
    Rejected(RejectReason),
    /// All quotas already filled; nothing more to capture.
    Complete,
}

pub struct EnrollmentSession {
    policy: DecisionPolicy,
    subject: SubjectId,
    quotas: [usize; 3],
    samples: Vec<EnrollmentSample>,
    consecutive_misses: u32,
    last_accept_at: Option<Instant>,
}

impl EnrollmentSession {
    pub fn new(policy: &DecisionPolicy, subject: SubjectId) -> Self {
        Self {
            quotas: policy.angle_quotas(),
            policy: policy.clone(),
            subject,
            samples: Vec::new(),
            consecutive_misses: 0,
            last_accept_at: None,
        }
    }

    fn collected_for(&self, angle: FaceAngle) -> usize {
        self.samples.iter().filter(|s| s.angle == angle).count()
    }

    /// The angle currently being captured, or `None` once every quota is
    /// filled.
    pub fn current_angle(&self) -> Option<FaceAngle> {
        FaceAngle::ALL
            .iter()
            .zip(self.quotas)
            .find(|(angle, quota)| self.collected_for(**angle) < *quota)
            .map(|(angle, _)| *angle)
    }

    pub fn is_complete(&self) -> bool {
        self.current_angle().is_none()
    }

    pub fn collected(&self) -> usize {
        self.samples.len()
    }

    /// Overall completion in [0, 100].
    pub fn progress(&self) -> f32 {
        self.samples.len() as f32 / self.policy.min_enrollment_samples as f32 * 100.0
    }

    /// Process one frame's detections. Only the consecutive-miss cap makes
    /// this fail; everything else is a per-frame verdict.
    pub fn step(
        &mut self,
        detections: &[Detection],
        now: Instant,
    ) -> Result<CaptureStep, EnrollmentError> {
        let Some(target) = self.current_angle() else {
            return Ok(CaptureStep::Complete);
        };

        let Some(best) = detections
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        else {
            self.consecutive_misses += 1;
            if self.consecutive_misses >= self.policy.max_consecutive_misses {
                return Err(EnrollmentError::NoFaceDetected {
                    misses: self.consecutive_misses,
                });
            }
            return Ok(CaptureStep::NoFace);
        };
        self.consecutive_misses = 0;

        if best.confidence < self.policy.detection_confidence_floor {
            return Ok(CaptureStep::Rejected(RejectReason::LowConfidence));
        }

        let Some(estimate) = pose::estimate(&best.landmarks) else {
            return Ok(CaptureStep::Rejected(RejectReason::NoPose));
        };

        if !target.matches(&estimate, self.policy.angle_tolerance_degrees) {
            return Ok(CaptureStep::Rejected(RejectReason::PoseMismatch {
                expected: target,
            }));
        }

        let width = best.bounding_box.width();
        if width < self.policy.min_face_size || width > self.policy.max_face_size {
            return Ok(CaptureStep::Rejected(RejectReason::FaceSizeOutOfBounds));
        }

        let quality = QualityMetrics::calculate(best, &self.policy);
        if !quality.meets(self.policy.min_sample_quality) {
            tracing::debug!(
                subject = %self.subject,
                score = quality.overall,
                "sample quality below acceptance threshold"
            );
            return Ok(CaptureStep::Rejected(RejectReason::LowQuality));
        }

        // Spacing keeps samples visually distinct rather than near-duplicate
        // frames of the same instant.
        if let Some(last) = self.last_accept_at {
            if now.duration_since(last) < self.policy.min_sample_interval() {
                return Ok(CaptureStep::Rejected(RejectReason::TooSoon));
            }
        }

        self.samples.push(EnrollmentSample {
            descriptor: best.descriptor.clone(),
            angle: target,
            quality: quality.overall,
            pose: estimate,
        });
        self.last_accept_at = Some(now);

        tracing::debug!(
            subject = %self.subject,
            angle = %target,
            quality = quality.overall,
            collected = self.samples.len(),
            required = self.policy.min_enrollment_samples,
            "enrollment sample accepted"
        );

        Ok(CaptureStep::Accepted {
            angle: target,
            quality: quality.overall,
        })
    }

    /// Build the template. Fails with `InsufficientSamples` when called on
    /// an incomplete session (abort, timeout, source exhausted).
    pub fn finish(self, model_version: &str) -> Result<EnrollmentTemplate, EnrollmentError> {
        if !self.is_complete() {
            return Err(EnrollmentError::InsufficientSamples {
                collected: self.samples.len(),
                required: self.policy.min_enrollment_samples,
            });
        }

        let descriptors: Vec<_> = self.samples.iter().map(|s| s.descriptor.clone()).collect();
        let consistency = descriptor_consistency(&descriptors);
        tracing::info!(
            subject = %self.subject,
            samples = self.samples.len(),
            consistency,
            "enrollment complete"
        );

        Ok(EnrollmentTemplate::from_samples(
            self.subject,
            self.samples,
            model_version,
        ))
    }
}
