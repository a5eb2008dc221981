//! Head-pose estimation and landmark geometry proxies.
//!
//! Works from landmarks alone, no extra inference. Two landmark layouts are
//! understood: the 5-point layout (left eye, right eye, nose tip, left and
//! right mouth corner) and the 68-point annotation scheme, from which the
//! same five anchors are derived (eye centroids from points 36-41 / 42-47,
//! nose tip 30, mouth corners 48 / 54). The eye-aspect-ratio and expression
//! measures need the full 68-point contours and return `None` otherwise.

use crate::types::{Detection, Point2D, PoseEstimate};

/// Degrees of yaw per unit of nose offset normalized by inter-eye distance.
const YAW_SCALE: f32 = 90.0;
/// Degrees of pitch per unit of vertical nose displacement along the
/// eye-to-mouth span.
const PITCH_SCALE: f32 = 60.0;
/// Where the nose tip sits on the eye-to-mouth span for a level head.
const NOSE_NOMINAL_T: f32 = 0.55;

const EPSILON: f32 = 1e-3;

struct Anchors {
    left_eye: Point2D,
    right_eye: Point2D,
    nose: Point2D,
    mouth_left: Point2D,
    mouth_right: Point2D,
}

fn centroid(points: &[Point2D]) -> Point2D {
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2D::new(sx / n, sy / n)
}

fn anchors(landmarks: &[Point2D]) -> Option<Anchors> {
    if landmarks.len() >= 68 {
        Some(Anchors {
            left_eye: centroid(&landmarks[36..42]),
            right_eye: centroid(&landmarks[42..48]),
            nose: landmarks[30],
            mouth_left: landmarks[48],
            mouth_right: landmarks[54],
        })
    } else if landmarks.len() >= 5 {
        Some(Anchors {
            left_eye: landmarks[0],
            right_eye: landmarks[1],
            nose: landmarks[2],
            mouth_left: landmarks[3],
            mouth_right: landmarks[4],
        })
    } else {
        None
    }
}

/// Estimate head orientation from landmark geometry. Returns `None` for
/// too few landmarks or a degenerate (collapsed) face.
pub fn estimate(landmarks: &[Point2D]) -> Option<PoseEstimate> {
    let a = anchors(landmarks)?;

    let inter_eye = a.left_eye.distance(&a.right_eye);
    if inter_eye < EPSILON {
        return None;
    }

    let eye_mid = a.left_eye.midpoint(&a.right_eye);
    let mouth_mid = a.mouth_left.midpoint(&a.mouth_right);
    let vertical_span = mouth_mid.y - eye_mid.y;
    if vertical_span.abs() < EPSILON {
        return None;
    }

    let yaw = (a.nose.x - eye_mid.x) / inter_eye * YAW_SCALE;
    let t = (a.nose.y - eye_mid.y) / vertical_span;
    let pitch = (NOSE_NOMINAL_T - t) * PITCH_SCALE;
    let roll = (a.right_eye.y - a.left_eye.y)
        .atan2(a.right_eye.x - a.left_eye.x)
        .to_degrees();

    Some(PoseEstimate { pitch, yaw, roll })
}

/// Classic eye-aspect-ratio, averaged over both eyes: the ratio of the
/// vertical eyelid gaps to the horizontal eye width. Drops sharply during
/// a blink. Requires the 68-point contours.
pub fn eye_aspect_ratio(landmarks: &[Point2D]) -> Option<f32> {
    if landmarks.len() < 68 {
        return None;
    }
    let left = single_ear(&landmarks[36..42])?;
    let right = single_ear(&landmarks[42..48])?;
    Some((left + right) / 2.0)
}

fn single_ear(eye: &[Point2D]) -> Option<f32> {
    let horizontal = eye[0].distance(&eye[3]);
    if horizontal < EPSILON {
        return None;
    }
    let v1 = eye[1].distance(&eye[5]);
    let v2 = eye[2].distance(&eye[4]);
    Some((v1 + v2) / (2.0 * horizontal))
}

/// Mouth-corner spread normalized by inter-eye distance. A coarse
/// expression measure: smiles widen it, pursed lips narrow it.
pub fn expression_ratio(landmarks: &[Point2D]) -> Option<f32> {
    let a = anchors(landmarks)?;
    let inter_eye = a.left_eye.distance(&a.right_eye);
    if inter_eye < EPSILON {
        return None;
    }
    Some(a.mouth_left.distance(&a.mouth_right) / inter_eye)
}

/// Depth-variation proxy: lateral deviation of the nose tip from the
/// eye-to-mouth axis, normalized by face width. A real head protrudes and
/// yields a small stable non-zero value; flat reproductions collapse it
/// toward zero or make it erratic as the sheet tilts.
pub fn depth_ratio(detection: &Detection) -> Option<f32> {
    let a = anchors(&detection.landmarks)?;
    let width = detection.bounding_box.width();
    if width < EPSILON {
        return None;
    }

    let eye_mid = a.left_eye.midpoint(&a.right_eye);
    let mouth_mid = a.mouth_left.midpoint(&a.mouth_right);
    let axis_x = mouth_mid.x - eye_mid.x;
    let axis_y = mouth_mid.y - eye_mid.y;
    let axis_len = (axis_x * axis_x + axis_y * axis_y).sqrt();
    if axis_len < EPSILON {
        return None;
    }

    // Perpendicular distance of the nose tip from the eye-mouth axis.
    let to_nose_x = a.nose.x - eye_mid.x;
    let to_nose_y = a.nose.y - eye_mid.y;
    let cross = (axis_x * to_nose_y - axis_y * to_nose_x).abs();
    Some(cross / axis_len / width)
}
