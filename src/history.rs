use std::collections::VecDeque;
use std::time::Instant;

use crate::types::Detection;

/// What one capture tick observed. A tick with no usable face still lands
/// here so the window reflects real elapsed capture, not just detections.
#[derive(Debug, Clone)]
pub struct Observation {
    pub detection: Option<Detection>,
    pub at: Instant,
}

/// Bounded rolling window of recent observations, oldest evicted first.
/// Owned by exactly one session; reset at session start and on cancel so a
/// decision never reflects frames from a prior session.
#[derive(Debug)]
pub struct FrameHistory {
    entries: VecDeque<Observation>,
    capacity: usize,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, detection: Option<Detection>, at: Instant) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Observation { detection, at });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Detections in arrival order, skipping empty ticks.
    pub fn detections(&self) -> impl Iterator<Item = &Detection> {
        self.entries.iter().filter_map(|o| o.detection.as_ref())
    }

    pub fn latest_detection(&self) -> Option<&Detection> {
        self.entries.iter().rev().find_map(|o| o.detection.as_ref())
    }
}
