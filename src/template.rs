use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    euclidean_distance, match_confidence, Descriptor, FaceAngle, PoseEstimate, SubjectId,
};

/// One accepted enrollment capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentSample {
    pub descriptor: Descriptor,
    pub angle: FaceAngle,
    pub quality: f32,
    pub pose: PoseEstimate,
}

/// The fused reference for one subject, handed to the caller's persistence
/// layer by value at enrollment completion. The engine keeps nothing after
/// handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentTemplate {
    pub subject: SubjectId,
    /// Per-dimension arithmetic mean of all accepted sample descriptors.
    pub average_descriptor: Descriptor,
    pub samples: Vec<EnrollmentSample>,
    pub quality_scores: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub model_version: String,
}

impl EnrollmentTemplate {
    pub fn from_samples(
        subject: SubjectId,
        samples: Vec<EnrollmentSample>,
        model_version: impl Into<String>,
    ) -> Self {
        let descriptors: Vec<&Descriptor> = samples.iter().map(|s| &s.descriptor).collect();
        let average_descriptor = average_descriptors(&descriptors);
        let quality_scores = samples.iter().map(|s| s.quality).collect();

        Self {
            subject,
            average_descriptor,
            samples,
            quality_scores,
            created_at: Utc::now(),
            model_version: model_version.into(),
        }
    }

    /// Similarity confidence of a live descriptor against this template.
    pub fn match_confidence(&self, probe: &Descriptor) -> f32 {
        match_confidence(euclidean_distance(probe, &self.average_descriptor))
    }
}

fn average_descriptors(descriptors: &[&Descriptor]) -> Descriptor {
    let Some(first) = descriptors.first() else {
        return Vec::new();
    };

    let mut averaged = vec![0.0f32; first.len()];
    for descriptor in descriptors {
        for (i, &value) in descriptor.iter().enumerate() {
            averaged[i] += value;
        }
    }

    let count = descriptors.len() as f32;
    for value in &mut averaged {
        *value /= count;
    }

    averaged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(descriptor: Vec<f32>, angle: FaceAngle) -> EnrollmentSample {
        EnrollmentSample {
            descriptor,
            angle,
            quality: 0.8,
            pose: PoseEstimate::default(),
        }
    }

    #[test]
    fn average_is_the_exact_per_dimension_mean() {
        let samples = vec![
            sample(vec![1.0, 0.0, 2.0], FaceAngle::Front),
            sample(vec![3.0, 1.0, 4.0], FaceAngle::LeftProfile),
            sample(vec![2.0, 2.0, 0.0], FaceAngle::RightProfile),
        ];
        let template =
            EnrollmentTemplate::from_samples(SubjectId::new("s-1"), samples, "model-v1");

        for (i, expected) in [2.0f32, 1.0, 2.0].iter().enumerate() {
            assert!(
                (template.average_descriptor[i] - expected).abs() < 1e-6,
                "dimension {i}"
            );
        }
        assert_eq!(template.quality_scores.len(), 3);
        assert_eq!(template.model_version, "model-v1");
    }

    #[test]
    fn averaging_holds_for_arbitrary_descriptors() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<EnrollmentSample> = (0..8)
            .map(|_| {
                let descriptor = (0..128).map(|_| rng.gen_range(-1.0..1.0)).collect();
                sample(descriptor, FaceAngle::Front)
            })
            .collect();
        let expected: Vec<f32> = (0..128)
            .map(|i| samples.iter().map(|s| s.descriptor[i]).sum::<f32>() / 8.0)
            .collect();

        let template =
            EnrollmentTemplate::from_samples(SubjectId::new("s-rand"), samples, "model-v1");
        for (got, want) in template.average_descriptor.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn template_matches_its_own_average_perfectly() {
        let samples = vec![
            sample(vec![0.25, -0.5, 0.75], FaceAngle::Front),
            sample(vec![0.35, -0.3, 0.65], FaceAngle::LeftProfile),
        ];
        let template =
            EnrollmentTemplate::from_samples(SubjectId::new("s-2"), samples, "model-v1");

        let probe = template.average_descriptor.clone();
        assert_eq!(template.match_confidence(&probe), 1.0);
    }

    #[test]
    fn template_round_trips_through_serde() {
        let samples = vec![sample(vec![0.1, 0.2], FaceAngle::Front)];
        let template =
            EnrollmentTemplate::from_samples(SubjectId::new("s-3"), samples, "model-v1");

        let encoded = toml::to_string(&template).unwrap();
        let decoded: EnrollmentTemplate = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.average_descriptor, template.average_descriptor);
        assert_eq!(decoded.subject, template.subject);
    }
}
