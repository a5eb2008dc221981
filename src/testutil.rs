//! Synthetic face fixtures shared by the unit tests.

use crate::types::{BoundingBox, Detection, Point2D};

/// 68-point landmark set: eye hexagons around (+/-20, 0), nose tip at
/// index 30, mouth corners at 48/54. `nose_x` encodes yaw and depth,
/// `eye_gap` the eyelid opening, `mouth_ratio` the expression spread.
pub fn face_landmarks(nose_x: f32, eye_gap: f32, mouth_ratio: f32) -> Vec<Point2D> {
    let mut lm = vec![Point2D::new(0.0, 0.0); 68];
    for (i, p) in eye_hexagon(-20.0, eye_gap).into_iter().enumerate() {
        lm[36 + i] = p;
    }
    for (i, p) in eye_hexagon(20.0, eye_gap).into_iter().enumerate() {
        lm[42 + i] = p;
    }
    lm[30] = Point2D::new(nose_x, 18.0);
    let half_spread = mouth_ratio * 40.0 / 2.0;
    lm[48] = Point2D::new(-half_spread, 30.0);
    lm[54] = Point2D::new(half_spread, 30.0);
    lm
}

fn eye_hexagon(cx: f32, gap: f32) -> [Point2D; 6] {
    let hw = 6.0;
    let hg = gap / 2.0;
    [
        Point2D::new(cx - hw, 0.0),
        Point2D::new(cx - hw / 3.0, -hg),
        Point2D::new(cx + hw / 3.0, -hg),
        Point2D::new(cx + hw, 0.0),
        Point2D::new(cx + hw / 3.0, hg),
        Point2D::new(cx - hw / 3.0, hg),
    ]
}

/// The i-th frame of a plausible live capture: slight yaw wobble, a blink
/// on the third frame, tiny expression changes, and slow descriptor drift
/// around `base_descriptor`.
pub fn live_frame(i: usize, base_descriptor: &[f32], confidence: f32) -> Detection {
    let noses = [2.0, 3.5, 1.0, 4.0, 2.5, 3.0];
    let gaps = [4.0, 4.0, 0.8, 4.0, 4.0, 4.0];
    let mouths = [0.60, 0.61, 0.60, 0.62, 0.59, 0.60];
    let k = i % 6;

    let descriptor = base_descriptor
        .iter()
        .map(|v| v + (i % 3) as f32 * 0.002)
        .collect();

    Detection {
        descriptor,
        landmarks: face_landmarks(noses[k], gaps[k], mouths[k]),
        bounding_box: BoundingBox {
            x1: -50.0,
            y1: -40.0,
            x2: 50.0,
            y2: 60.0,
        },
        confidence,
        texture_score: 0.9,
    }
}
