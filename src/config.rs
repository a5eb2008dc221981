//! The decision policy: every numeric threshold the engine consults lives
//! here, loadable from TOML with per-field defaults. The capture and
//! verification loops contain no threshold literals of their own, so tuning
//! happens in one place.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::PolicyError;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Total accepted samples required across all angles before an
    /// enrollment can complete.
    pub min_enrollment_samples: usize,
    /// Degrees of yaw/pitch slack when classifying a pose against a
    /// required enrollment angle.
    pub angle_tolerance_degrees: f32,
    /// Detections below this model confidence are ignored (inclusive
    /// boundary: a detection exactly at the floor passes).
    pub detection_confidence_floor: f32,
    /// Match-confidence bar at the start of a verification session.
    pub base_match_threshold: f32,
    /// The bar never relaxes below this, whatever the attempt progress.
    pub floor_match_threshold: f32,
    /// How much of the bar erodes as attempt progress goes 0 -> 1.
    pub threshold_decay: f32,
    /// Minimum fraction of liveness checks that must pass.
    pub liveness_threshold: f32,
    /// Match attempts allowed before a session is denied.
    pub max_attempts: u32,
    /// Hard wall-clock ceiling for one verification session, milliseconds.
    pub max_session_duration_ms: u64,
    /// Wall-time between capture ticks, milliseconds.
    pub sample_tick_interval_ms: u64,
    /// Minimum spacing between match attempts, milliseconds.
    pub match_attempt_throttle_ms: u64,
    /// Minimum spacing between accepted enrollment samples, milliseconds.
    /// Keeps samples visually distinct instead of motion-blurred duplicates.
    pub min_sample_interval_ms: u64,
    /// Optional explicit enrollment ceiling; when absent one is derived
    /// from the sample count and interval.
    pub enrollment_timeout_ms: Option<u64>,
    /// Consecutive frames without any detection before enrollment gives up.
    pub max_consecutive_misses: u32,
    /// Acceptable face bounding-box width range, pixels.
    pub min_face_size: f32,
    pub max_face_size: f32,
    /// Minimum overall quality score for an enrollment sample.
    pub min_sample_quality: f32,
    /// Rolling frame-history capacity (FIFO, oldest evicted first).
    pub history_capacity: usize,
    /// Consecutive match attempts with a hard spoof indicator before the
    /// session is denied outright instead of burning the full budget.
    pub spoof_strike_limit: u32,
    pub liveness: LivenessTuning,
}

/// Tuning for the individual liveness heuristics. The concrete detectors
/// are placeholders by design and swappable; only their gate/signal roles
/// are fixed.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LivenessTuning {
    /// Detections needed in the window before the series checks (blink,
    /// movement, micro-expression) produce evidence.
    pub min_window: usize,
    /// Eye-aspect-ratio below which an eye counts as closed.
    pub ear_blink_threshold: f32,
    /// Eye-aspect-ratio above which an eye counts as open.
    pub ear_open_threshold: f32,
    /// Minimum pose-angle standard deviation (degrees) to rule out a
    /// static photo.
    pub movement_epsilon_degrees: f32,
    /// Expression variability below this reads as frozen/mask-like.
    pub expression_frozen_floor: f32,
    /// Expression variability above this reads as erratic/non-human.
    pub expression_mask_ceiling: f32,
    /// Mouth-spread to inter-eye ratio of a neutral face, shared with the
    /// quality scorer's neutrality component.
    pub expression_nominal_ratio: f32,
    /// Depth-proxy values below this read as flat (photo/screen).
    pub depth_min_ratio: f32,
    /// Maximum spread of the depth proxy across the window.
    pub depth_tolerance: f32,
    /// Depth-proxy value that maps to a full depth-variation quality score.
    pub depth_nominal_ratio: f32,
    /// Minimum texture-authenticity score from the classifier.
    pub texture_threshold: f32,
    /// Maximum descriptor drift between consecutive frames that still
    /// reads as human motion rather than replay/content swapping.
    pub temporal_drift_bound: f32,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            min_enrollment_samples: 8,
            angle_tolerance_degrees: 15.0,
            detection_confidence_floor: 0.6,
            base_match_threshold: 0.8,
            floor_match_threshold: 0.7,
            threshold_decay: 0.1,
            liveness_threshold: 0.6,
            max_attempts: 10,
            max_session_duration_ms: 30_000,
            sample_tick_interval_ms: 150,
            match_attempt_throttle_ms: 500,
            min_sample_interval_ms: 700,
            enrollment_timeout_ms: None,
            max_consecutive_misses: 40,
            min_face_size: 80.0,
            max_face_size: 480.0,
            min_sample_quality: 0.6,
            history_capacity: 16,
            spoof_strike_limit: 3,
            liveness: LivenessTuning::default(),
        }
    }
}

impl Default for LivenessTuning {
    fn default() -> Self {
        Self {
            min_window: 4,
            ear_blink_threshold: 0.18,
            ear_open_threshold: 0.24,
            movement_epsilon_degrees: 1.5,
            expression_frozen_floor: 0.002,
            expression_mask_ceiling: 0.08,
            expression_nominal_ratio: 0.6,
            depth_min_ratio: 0.01,
            depth_tolerance: 0.05,
            depth_nominal_ratio: 0.08,
            texture_threshold: 0.5,
            temporal_drift_bound: 0.35,
        }
    }
}

impl DecisionPolicy {
    pub fn load_from_path(path: &Path) -> Result<Self, PolicyError> {
        if !path.exists() {
            return Err(PolicyError::Invalid(format!(
                "policy file not found: {}",
                path.display()
            )));
        }

        tracing::debug!("loading decision policy from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let policy: DecisionPolicy =
            toml::from_str(&contents).map_err(|e| PolicyError::Parse(e.to_string()))?;

        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        fn unit_range(name: &str, value: f32) -> Result<(), PolicyError> {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::Invalid(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
            Ok(())
        }

        unit_range("detection_confidence_floor", self.detection_confidence_floor)?;
        unit_range("base_match_threshold", self.base_match_threshold)?;
        unit_range("floor_match_threshold", self.floor_match_threshold)?;
        unit_range("liveness_threshold", self.liveness_threshold)?;
        unit_range("min_sample_quality", self.min_sample_quality)?;
        unit_range("texture_threshold", self.liveness.texture_threshold)?;

        if self.floor_match_threshold > self.base_match_threshold {
            return Err(PolicyError::Invalid(format!(
                "floor_match_threshold ({}) must not exceed base_match_threshold ({})",
                self.floor_match_threshold, self.base_match_threshold
            )));
        }
        if self.threshold_decay < 0.0 {
            return Err(PolicyError::Invalid(
                "threshold_decay must not be negative".into(),
            ));
        }
        if self.min_enrollment_samples < crate::types::FaceAngle::ALL.len() {
            return Err(PolicyError::Invalid(format!(
                "min_enrollment_samples must cover every required angle, got {}",
                self.min_enrollment_samples
            )));
        }
        if self.min_face_size <= 0.0 || self.max_face_size <= self.min_face_size {
            return Err(PolicyError::Invalid(format!(
                "face size bounds must satisfy 0 < min < max, got {}..{}",
                self.min_face_size, self.max_face_size
            )));
        }
        if self.max_attempts == 0 {
            return Err(PolicyError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.sample_tick_interval_ms == 0 || self.max_session_duration_ms == 0 {
            return Err(PolicyError::Invalid(
                "tick interval and session duration must be non-zero".into(),
            ));
        }
        if self.history_capacity < 2 {
            return Err(PolicyError::Invalid(
                "history_capacity must hold at least 2 frames".into(),
            ));
        }
        if self.spoof_strike_limit == 0 {
            return Err(PolicyError::Invalid(
                "spoof_strike_limit must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// The match-confidence bar for a given attempt progress in [0, 1].
    /// Monotonically non-increasing in progress; never below the floor.
    pub fn progressive_threshold(&self, elapsed_progress: f32) -> f32 {
        let progress = elapsed_progress.clamp(0.0, 1.0);
        (self.base_match_threshold - progress * self.threshold_decay)
            .max(self.floor_match_threshold)
    }

    /// Per-angle sample quotas, in required-angle order. Earlier angles
    /// absorb the remainder: 8 samples over 3 angles means 3/3/2.
    pub fn angle_quotas(&self) -> [usize; 3] {
        let angles = crate::types::FaceAngle::ALL.len();
        let base = self.min_enrollment_samples / angles;
        let remainder = self.min_enrollment_samples % angles;
        let mut quotas = [base; 3];
        for quota in quotas.iter_mut().take(remainder) {
            *quota += 1;
        }
        quotas
    }

    pub fn max_session_duration(&self) -> Duration {
        Duration::from_millis(self.max_session_duration_ms)
    }

    pub fn sample_tick_interval(&self) -> Duration {
        Duration::from_millis(self.sample_tick_interval_ms)
    }

    pub fn match_attempt_throttle(&self) -> Duration {
        Duration::from_millis(self.match_attempt_throttle_ms)
    }

    pub fn min_sample_interval(&self) -> Duration {
        Duration::from_millis(self.min_sample_interval_ms)
    }

    /// Enrollment wall-clock ceiling. When not set explicitly, allow five
    /// times the ideal capture time, which leaves room for retakes.
    pub fn enrollment_timeout(&self) -> Duration {
        match self.enrollment_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(
                self.min_enrollment_samples as u64 * self.min_sample_interval_ms * 5,
            ),
        }
    }
}
