//! Multi-signal liveness evaluation over the rolling frame history.
//!
//! Six independent heuristics, each pure over the window. A check that
//! lacks history returns "no evidence yet" — it counts as failed in the
//! composite score but raises no spoof indicator, so a session that just
//! started is merely unproven, not suspect.
//!
//! Texture, depth and temporal consistency are hard gates: when they fail
//! with real evidence they raise a named spoof indicator and the session
//! can never authorize on that attempt. Blink, head movement and
//! micro-expression are soft signals that only feed the score.
//!
//! The concrete heuristics are deliberately lightweight proxies and are
//! expected to be hardened or replaced independently; only their gate/signal
//! roles and the composite rule are load-bearing.

use crate::config::DecisionPolicy;
use crate::history::FrameHistory;
use crate::pose;
use crate::types::{euclidean_distance, Detection, PoseEstimate};

pub const TEXTURE_TAG: &str = "texture";
pub const DEPTH_TAG: &str = "depth";
pub const TEMPORAL_TAG: &str = "temporal";

const CHECK_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LivenessChecks {
    pub blink: bool,
    pub head_movement: bool,
    pub micro_expression: bool,
    pub depth: bool,
    pub texture: bool,
    pub temporal: bool,
}

#[derive(Debug, Clone)]
pub struct LivenessResult {
    pub checks: LivenessChecks,
    /// Fraction of checks that passed, in [0, 1].
    pub score: f32,
    /// Tags of hard gates that failed with sufficient evidence.
    pub spoof_indicators: Vec<&'static str>,
}

impl LivenessResult {
    pub fn is_live(&self, threshold: f32) -> bool {
        self.score >= threshold && self.spoof_indicators.is_empty()
    }
}

pub fn evaluate(history: &FrameHistory, policy: &DecisionPolicy) -> LivenessResult {
    let tuning = &policy.liveness;
    let detections: Vec<&Detection> = history.detections().collect();

    let ears: Vec<f32> = detections
        .iter()
        .filter_map(|d| pose::eye_aspect_ratio(&d.landmarks))
        .collect();
    let poses: Vec<PoseEstimate> = detections
        .iter()
        .filter_map(|d| pose::estimate(&d.landmarks))
        .collect();
    let expressions: Vec<f32> = detections
        .iter()
        .filter_map(|d| pose::expression_ratio(&d.landmarks))
        .collect();
    let depths: Vec<f32> = detections
        .iter()
        .filter_map(|d| pose::depth_ratio(d))
        .collect();

    let blink = blink_pattern(&ears, tuning.min_window, tuning.ear_blink_threshold, tuning.ear_open_threshold);
    let head_movement = head_movement(&poses, tuning.min_window, tuning.movement_epsilon_degrees);
    let micro_expression = micro_expression(
        &expressions,
        tuning.min_window,
        tuning.expression_frozen_floor,
        tuning.expression_mask_ceiling,
    );
    let depth = depth_consistency(&depths, tuning.depth_min_ratio, tuning.depth_tolerance);
    let texture = texture_authenticity(detections.last().copied(), tuning.texture_threshold);
    let temporal = temporal_consistency(&detections, tuning.temporal_drift_bound);

    let checks = LivenessChecks {
        blink: blink.unwrap_or(false),
        head_movement: head_movement.unwrap_or(false),
        micro_expression: micro_expression.unwrap_or(false),
        depth: depth.unwrap_or(false),
        texture: texture.unwrap_or(false),
        temporal: temporal.unwrap_or(false),
    };

    let mut spoof_indicators = Vec::new();
    if texture == Some(false) {
        spoof_indicators.push(TEXTURE_TAG);
    }
    if depth == Some(false) {
        spoof_indicators.push(DEPTH_TAG);
    }
    if temporal == Some(false) {
        spoof_indicators.push(TEMPORAL_TAG);
    }

    let passed = [
        checks.blink,
        checks.head_movement,
        checks.micro_expression,
        checks.depth,
        checks.texture,
        checks.temporal,
    ]
    .iter()
    .filter(|&&c| c)
    .count();

    LivenessResult {
        checks,
        score: passed as f32 / CHECK_COUNT as f32,
        spoof_indicators,
    }
}

/// A natural blink is a transient dip-and-recover in eye aspect ratio:
/// open before, closed at the dip, open again after.
fn blink_pattern(ears: &[f32], min_window: usize, blink: f32, open: f32) -> Option<bool> {
    if ears.len() < min_window {
        return None;
    }

    for (j, &ear) in ears.iter().enumerate() {
        if ear >= blink {
            continue;
        }
        let opened_before = ears[..j].iter().any(|&e| e >= open);
        let opened_after = ears[j + 1..].iter().any(|&e| e >= open);
        if opened_before && opened_after {
            return Some(true);
        }
    }
    Some(false)
}

/// Pose-angle spread across the window. A mounted photo gives essentially
/// zero; a head on a neck never does.
fn head_movement(poses: &[PoseEstimate], min_window: usize, epsilon: f32) -> Option<bool> {
    if poses.len() < min_window {
        return None;
    }
    let yaw_sd = std_dev(poses.iter().map(|p| p.yaw));
    let pitch_sd = std_dev(poses.iter().map(|p| p.pitch));
    Some(yaw_sd.max(pitch_sd) >= epsilon)
}

/// Expression variability between the frozen floor (mask, photo) and the
/// mask-like ceiling (erratic non-human warping).
fn micro_expression(
    expressions: &[f32],
    min_window: usize,
    floor: f32,
    ceiling: f32,
) -> Option<bool> {
    if expressions.len() < min_window {
        return None;
    }
    let sd = std_dev(expressions.iter().copied());
    Some(sd > floor && sd < ceiling)
}

/// Depth proxy must be clearly non-zero and stable. Flat reproductions sit
/// near zero or jitter as the sheet or screen tilts.
fn depth_consistency(depths: &[f32], min_ratio: f32, tolerance: f32) -> Option<bool> {
    if depths.len() < 2 {
        return None;
    }
    let min = depths.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = depths.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    Some(min >= min_ratio && (max - min) <= tolerance)
}

/// Screen/print artifact classifier output on the most recent face.
fn texture_authenticity(latest: Option<&Detection>, threshold: f32) -> Option<bool> {
    latest.map(|d| d.texture_score >= threshold)
}

/// Descriptor drift between consecutive frames must stay within a
/// plausible human-motion bound; a swap to different content mid-stream
/// produces a jump no live face can.
fn temporal_consistency(detections: &[&Detection], drift_bound: f32) -> Option<bool> {
    if detections.len() < 2 {
        return None;
    }
    let within = detections
        .windows(2)
        .all(|w| euclidean_distance(&w[0].descriptor, &w[1].descriptor) <= drift_bound);
    Some(within)
}

fn std_dev(values: impl Iterator<Item = f32>) -> f32 {
    let values: Vec<f32> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}
