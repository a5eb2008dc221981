use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-length face descriptor produced by the extraction model.
/// Length is model-dependent (128 for the default model) and immutable
/// once produced. Compared via Euclidean distance.
pub type Descriptor = Vec<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        Point2D::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// One detected face in a frame. Landmarks follow either the 5-point
/// convention (left eye, right eye, nose tip, left/right mouth corner)
/// or the 68-point annotation scheme; `crate::pose` handles both.
#[derive(Debug, Clone)]
pub struct Detection {
    pub descriptor: Descriptor,
    pub landmarks: Vec<Point2D>,
    pub bounding_box: BoundingBox,
    /// Model confidence for this detection, in [0, 1].
    pub confidence: f32,
    /// Output of the texture-authenticity classifier for this face crop,
    /// in [0, 1]. Higher means less screen/print artifact evidence.
    pub texture_score: f32,
}

/// Head orientation in degrees. Positive yaw is a turn toward the
/// subject's right profile as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Head angles required during enrollment, captured in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceAngle {
    Front,
    LeftProfile,
    RightProfile,
}

impl FaceAngle {
    pub const ALL: [FaceAngle; 3] = [
        FaceAngle::Front,
        FaceAngle::LeftProfile,
        FaceAngle::RightProfile,
    ];

    /// Nominal yaw for this angle, in degrees.
    pub fn target_yaw(&self) -> f32 {
        match self {
            FaceAngle::Front => 0.0,
            FaceAngle::LeftProfile => -30.0,
            FaceAngle::RightProfile => 30.0,
        }
    }

    /// Whether `pose` counts as this angle. Yaw must sit within
    /// `tolerance` degrees of the nominal yaw and pitch must stay level
    /// within the same tolerance. Boundary values count as matching.
    pub fn matches(&self, pose: &PoseEstimate, tolerance: f32) -> bool {
        (pose.yaw - self.target_yaw()).abs() <= tolerance && pose.pitch.abs() <= tolerance
    }
}

impl fmt::Display for FaceAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceAngle::Front => write!(f, "front"),
            FaceAngle::LeftProfile => write!(f, "left profile"),
            FaceAngle::RightProfile => write!(f, "right profile"),
        }
    }
}

/// Identifier of the subject being enrolled or verified. Resolution of
/// application-level identities (wallet address, account id, ...) to a
/// subject id is the caller's job; the engine only ever sees this one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Euclidean distance between two descriptors. Mismatched lengths
/// (different model versions) yield `f32::INFINITY` so they can never match.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Similarity confidence derived from descriptor distance: identical
/// descriptors score 1.0, anything at distance >= 1.0 scores 0.0.
pub fn match_confidence(distance: f32) -> f32 {
    (1.0 - distance).max(0.0)
}
