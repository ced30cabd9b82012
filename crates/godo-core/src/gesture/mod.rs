//! Gesture input types, classification and ordering.

mod classifier;
mod tracker;

pub use classifier::{
    CommitBasis, GestureClassifier, Provisional, Release, ThresholdClassifier, Thresholds,
};
pub use tracker::GestureTracker;

use serde::{Deserialize, Serialize};

/// Cumulative displacement since the gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    pub dx: f64,
    pub dy: f64,
}

impl GestureSample {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

/// Final sample when the pointer is released.
///
/// Velocity may be missing when the rendering layer could not measure it;
/// such a release never commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEnd {
    pub dx: f64,
    pub dy: f64,
    #[serde(default)]
    pub vx: Option<f64>,
    #[serde(default)]
    pub vy: Option<f64>,
}

impl GestureEnd {
    pub fn new(dx: f64, dy: f64, vx: f64, vy: f64) -> Self {
        Self {
            dx,
            dy,
            vx: Some(vx),
            vy: Some(vy),
        }
    }
}
