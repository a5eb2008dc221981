//! The continuous verification state machine.
//!
//! `Idle -> Sampling -> Matching -> {Authorized | Denied | TimedOut}`.
//! The session is advanced one tick at a time with `step(detections, now)`;
//! it never sleeps or reads the clock itself, which keeps the timing
//! behavior fully scriptable. Drivers own the tick cadence.

use std::time::Instant;

use crate::config::DecisionPolicy;
use crate::history::FrameHistory;
use crate::liveness::{self, LivenessResult};
use crate::template::EnrollmentTemplate;
use crate::types::{euclidean_distance, match_confidence, Descriptor, Detection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sampling,
    Matching,
    Authorized,
    Denied,
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Authorized | SessionState::Denied | SessionState::TimedOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The attempt budget ran out without ever meeting the authorize
    /// condition.
    AttemptsExhausted,
    /// Hard liveness gates failed repeatedly; the session fails fast
    /// instead of burning the remaining budget on likely spoof material.
    SpoofSuspected,
}

/// Terminal result of a verification session. `TimedOut` is deliberately
/// distinct from `Denied`: the caller can offer a retry for the former and
/// flag the latter for review.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Authorized {
        confidence: f32,
    },
    Denied {
        reason: DenialReason,
        spoof_indicators: Vec<&'static str>,
    },
    TimedOut,
}

/// What one tick did, for drivers and progress reporting.
#[derive(Debug)]
pub struct StepReport {
    pub state: SessionState,
    /// Completion estimate in [0, 100], the larger of attempt and time
    /// progress.
    pub progress: f32,
    /// Match confidence of this tick's attempt, when one ran.
    pub confidence: Option<f32>,
    pub liveness: Option<LivenessResult>,
}

pub struct VerificationSession {
    policy: DecisionPolicy,
    reference: Descriptor,
    state: SessionState,
    history: FrameHistory,
    started_at: Option<Instant>,
    attempts: u32,
    spoof_strikes: u32,
    last_attempt_at: Option<Instant>,
    outcome: Option<VerificationOutcome>,
}

impl VerificationSession {
    pub fn new(policy: &DecisionPolicy, template: &EnrollmentTemplate) -> Self {
        Self {
            history: FrameHistory::new(policy.history_capacity),
            policy: policy.clone(),
            reference: template.average_descriptor.clone(),
            state: SessionState::Idle,
            started_at: None,
            attempts: 0,
            spoof_strikes: 0,
            last_attempt_at: None,
            outcome: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        self.outcome.as_ref()
    }

    /// Begin sampling. History always starts empty: a decision never
    /// reflects frames from a prior session.
    pub fn start(&mut self, now: Instant) {
        if self.state != SessionState::Idle {
            return;
        }
        self.history.clear();
        self.started_at = Some(now);
        self.state = SessionState::Sampling;
    }

    /// External cancellation: immediately terminal, idempotent, flushes
    /// the frame history.
    pub fn cancel(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.history.clear();
        self.finish(SessionState::TimedOut, VerificationOutcome::TimedOut);
    }

    /// Advance one tick with the detections extracted from the latest
    /// frame. No-op once terminal.
    pub fn step(&mut self, detections: Vec<Detection>, now: Instant) -> StepReport {
        if self.is_terminal() {
            return self.report(None, None, now);
        }
        if self.state == SessionState::Idle {
            self.start(now);
        }

        // The wall-clock ceiling overrides everything, including a match
        // attempt this tick might have won.
        let started = self.started_at.unwrap_or(now);
        if now.duration_since(started) >= self.policy.max_session_duration() {
            self.finish(SessionState::TimedOut, VerificationOutcome::TimedOut);
            return self.report(None, None, now);
        }

        // A crowd is not an error: the strongest detection represents the
        // frame, the rest are ignored.
        let best = detections
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
        self.history.push(best.clone(), now);

        let Some(best) = best else {
            return self.report(None, None, now);
        };
        if best.confidence < self.policy.detection_confidence_floor {
            return self.report(None, None, now);
        }
        if let Some(last) = self.last_attempt_at {
            // Throttled: keep sampling instead of saturating the matcher.
            if now.duration_since(last) < self.policy.match_attempt_throttle() {
                return self.report(None, None, now);
            }
        }

        self.state = SessionState::Matching;
        let progress_before = self.attempts as f32 / self.policy.max_attempts as f32;
        self.attempts += 1;
        self.last_attempt_at = Some(now);

        let confidence = match_confidence(euclidean_distance(&best.descriptor, &self.reference));
        let liveness = liveness::evaluate(&self.history, &self.policy);
        let threshold = self.policy.progressive_threshold(progress_before);

        tracing::debug!(
            attempt = self.attempts,
            confidence,
            threshold,
            liveness_score = liveness.score,
            spoof_indicators = ?liveness.spoof_indicators,
            "match attempt"
        );

        if confidence >= threshold && liveness.is_live(self.policy.liveness_threshold) {
            self.finish(
                SessionState::Authorized,
                VerificationOutcome::Authorized { confidence },
            );
            return self.report(Some(confidence), Some(liveness), now);
        }

        if liveness.spoof_indicators.is_empty() {
            self.spoof_strikes = 0;
        } else {
            self.spoof_strikes += 1;
            if self.spoof_strikes >= self.policy.spoof_strike_limit {
                let indicators = liveness.spoof_indicators.clone();
                self.finish(
                    SessionState::Denied,
                    VerificationOutcome::Denied {
                        reason: DenialReason::SpoofSuspected,
                        spoof_indicators: indicators,
                    },
                );
                return self.report(Some(confidence), Some(liveness), now);
            }
        }

        if self.attempts >= self.policy.max_attempts {
            let indicators = liveness.spoof_indicators.clone();
            self.finish(
                SessionState::Denied,
                VerificationOutcome::Denied {
                    reason: DenialReason::AttemptsExhausted,
                    spoof_indicators: indicators,
                },
            );
            return self.report(Some(confidence), Some(liveness), now);
        }

        self.state = SessionState::Sampling;
        self.report(Some(confidence), Some(liveness), now)
    }

    fn finish(&mut self, state: SessionState, outcome: VerificationOutcome) {
        tracing::info!(state = ?state, attempts = self.attempts, "verification session finished");
        self.state = state;
        self.outcome = Some(outcome);
    }

    fn report(
        &self,
        confidence: Option<f32>,
        liveness: Option<LivenessResult>,
        now: Instant,
    ) -> StepReport {
        let attempt_progress = self.attempts as f32 / self.policy.max_attempts as f32;
        let time_progress = self
            .started_at
            .map(|s| {
                now.duration_since(s).as_secs_f32()
                    / self.policy.max_session_duration().as_secs_f32()
            })
            .unwrap_or(0.0);

        StepReport {
            state: self.state,
            progress: attempt_progress.max(time_progress).clamp(0.0, 1.0) * 100.0,
            confidence,
            liveness,
        }
    }
}
