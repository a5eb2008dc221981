use crate::config::DecisionPolicy;
use crate::pose;
use crate::types::{Descriptor, Detection};

/// How far mouth-spread may drift from neutral before the neutrality
/// component bottoms out.
const NEUTRALITY_FALLOFF: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct QualityMetrics {
    pub detection_confidence: f32,
    pub face_size_score: f32,
    pub depth_score: f32,
    pub expression_score: f32,
    pub overall: f32,
}

impl QualityMetrics {
    /// Score one detection. Pure and deterministic: the same detection and
    /// policy always produce the same metrics.
    pub fn calculate(detection: &Detection, policy: &DecisionPolicy) -> Self {
        let detection_confidence = detection.confidence.clamp(0.0, 1.0);

        // How much face the frame actually gives us, normalized against
        // the smallest acceptable face and capped at 1.0.
        let face_size_score =
            (detection.bounding_box.width() / policy.min_face_size).clamp(0.0, 1.0);

        let depth_score = pose::depth_ratio(detection)
            .map(|ratio| (ratio / policy.liveness.depth_nominal_ratio).min(1.0))
            .unwrap_or(0.0);

        // Expression neutrality: full marks at the nominal mouth spread,
        // falling off linearly. Zero when landmarks cannot support it.
        let expression_score = pose::expression_ratio(&detection.landmarks)
            .map(|ratio| {
                (1.0 - (ratio - policy.liveness.expression_nominal_ratio).abs()
                    * NEUTRALITY_FALLOFF)
                    .clamp(0.0, 1.0)
            })
            .unwrap_or(0.0);

        let overall = (detection_confidence * 0.4
            + face_size_score * 0.2
            + depth_score * 0.2
            + expression_score * 0.2)
            .clamp(0.0, 1.0);

        QualityMetrics {
            detection_confidence,
            face_size_score,
            depth_score,
            expression_score,
            overall,
        }
    }

    pub fn meets(&self, min_quality: f32) -> bool {
        self.overall >= min_quality
    }
}

/// Robustness score for a set of enrollment descriptors. Samples of one
/// person should be similar but not identical: some pose and lighting
/// variation makes the template generalize. Scores the pairwise cosine
/// similarity against an ideal band.
pub fn descriptor_consistency(descriptors: &[Descriptor]) -> f32 {
    const IDEAL_SIMILARITY: f32 = 0.82;
    const IDEAL_VARIANCE: f32 = 0.005;

    if descriptors.len() < 2 {
        return 0.8;
    }

    let mut similarities = Vec::new();
    for i in 0..descriptors.len() {
        for j in i + 1..descriptors.len() {
            similarities.push(cosine_similarity(&descriptors[i], &descriptors[j]));
        }
    }

    let avg = similarities.iter().sum::<f32>() / similarities.len() as f32;
    let variance =
        similarities.iter().map(|s| (s - avg).powi(2)).sum::<f32>() / similarities.len() as f32;

    let similarity_score = 1.0 - (avg - IDEAL_SIMILARITY).abs() * 2.0;
    let variance_score = if variance < 0.001 || variance > 0.02 {
        // No variation at all, or too much to be one person.
        0.7
    } else {
        1.0 - (variance - IDEAL_VARIANCE).abs() * 10.0
    };

    (similarity_score * 0.7 + variance_score * 0.3).clamp(0.0, 1.0)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
