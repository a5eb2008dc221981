//! Scripted capability doubles and synthetic face fixtures for the
//! end-to-end scenarios.

use std::collections::VecDeque;

use facegate::{
    BoundingBox, DecisionPolicy, DescriptorExtractor, Detection, EnrollmentError,
    EnrollmentObserver, EnrollmentTemplate, ExtractorError, FaceAngle, FrameSource, Point2D,
    VerificationObserver, VerificationOutcome,
};

/// A "frame" in these tests is simply the detections the extractor will
/// report for it.
pub type ScriptFrame = Vec<Detection>;

pub struct ScriptedSource {
    frames: VecDeque<ScriptFrame>,
    cycle: bool,
}

impl ScriptedSource {
    /// Yields each frame once, then reports end-of-capture.
    pub fn finite(frames: Vec<ScriptFrame>) -> Self {
        Self {
            frames: frames.into(),
            cycle: false,
        }
    }

    /// Loops over the frames forever.
    pub fn cycling(frames: Vec<ScriptFrame>) -> Self {
        Self {
            frames: frames.into(),
            cycle: true,
        }
    }
}

impl FrameSource for ScriptedSource {
    type Frame = ScriptFrame;

    fn next_frame(&mut self) -> Option<ScriptFrame> {
        let frame = self.frames.pop_front()?;
        if self.cycle {
            self.frames.push_back(frame.clone());
        }
        Some(frame)
    }
}

/// Extractor that reports exactly what the scripted frame carries.
pub struct PassthroughExtractor;

impl DescriptorExtractor for PassthroughExtractor {
    type Frame = ScriptFrame;

    fn extract(&mut self, frame: &ScriptFrame) -> Result<Vec<Detection>, ExtractorError> {
        Ok(frame.clone())
    }

    fn model_version(&self) -> &str {
        "mock-v1"
    }
}

/// Extractor whose model never came up.
pub struct BrokenExtractor;

impl DescriptorExtractor for BrokenExtractor {
    type Frame = ScriptFrame;

    fn extract(&mut self, _frame: &ScriptFrame) -> Result<Vec<Detection>, ExtractorError> {
        Err(ExtractorError::Unavailable("model failed to load".into()))
    }
}

/// Records every callback for assertions.
#[derive(Default)]
pub struct Recorder {
    pub enroll_progress: Vec<(FaceAngle, f32)>,
    pub samples_accepted: usize,
    pub completed: bool,
    pub enroll_error: Option<String>,
    pub verify_progress: Vec<f32>,
    pub success_confidence: Option<f32>,
    pub failure: Option<VerificationOutcome>,
}

impl EnrollmentObserver for Recorder {
    fn on_progress(&mut self, angle: FaceAngle, percent: f32) {
        self.enroll_progress.push((angle, percent));
    }

    fn on_sample_accepted(&mut self, _angle: FaceAngle, _quality: f32) {
        self.samples_accepted += 1;
    }

    fn on_complete(&mut self, _template: &EnrollmentTemplate) {
        self.completed = true;
    }

    fn on_error(&mut self, error: &EnrollmentError) {
        self.enroll_error = Some(error.to_string());
    }
}

impl VerificationObserver for Recorder {
    fn on_progress(&mut self, percent: f32) {
        self.verify_progress.push(percent);
    }

    fn on_success(&mut self, confidence: f32) {
        self.success_confidence = Some(confidence);
    }

    fn on_failure(&mut self, outcome: &VerificationOutcome) {
        self.failure = Some(outcome.clone());
    }
}

/// Policy with millisecond-scale timing so the blocking drivers finish
/// quickly under test. Also hooks session tracing into the test harness
/// output.
pub fn fast_policy() -> DecisionPolicy {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    DecisionPolicy {
        sample_tick_interval_ms: 1,
        match_attempt_throttle_ms: 0,
        min_sample_interval_ms: 1,
        enrollment_timeout_ms: Some(5_000),
        max_session_duration_ms: 5_000,
        ..DecisionPolicy::default()
    }
}

/// 68-point landmark set: eye hexagons around (+/-20, 0), nose tip at
/// index 30, mouth corners at 48/54.
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

/// A detection posed at `yaw` degrees with well-behaved quality inputs.
pub fn posed_detection(yaw: f32, confidence: f32, descriptor: Vec<f32>) -> Detection {
    let nose_x = yaw / 90.0 * 40.0;
    Detection {
        descriptor,
        landmarks: face_landmarks(if nose_x.abs() < 1.0 { 2.0 } else { nose_x }, 4.0, 0.6),
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

/// The i-th frame of a plausible live capture: yaw wobble, a blink on the
/// third frame, expression micro-variation, slow descriptor drift.
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

pub fn base_descriptor() -> Vec<f32> {
    vec![0.5; 16]
}
