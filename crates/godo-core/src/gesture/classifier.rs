//! Threshold-based swipe classification.
//!
//! A drag produces a stream of cumulative displacement samples. While the
//! pointer is down the classifier reports a provisional direction for
//! overlay feedback; on release it either commits a [`Direction`] or asks
//! the card to return to its origin.
//!
//! ## Axis rule
//!
//! ```text
//! |x| > |y|  ->  horizontal: x > 0 commit-private, else discard
//! otherwise  ->  vertical:   y > 0 defer,          else commit-public
//! ```
//!
//! Equal magnitudes resolve to the vertical axis.

use serde::{Deserialize, Serialize};

use super::{GestureEnd, GestureSample};
use crate::direction::Direction;
use crate::error::ValidationError;

/// Distance and velocity thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Displacement above which a provisional direction is shown.
    pub provisional_distance: f64,
    /// Displacement above which a release commits.
    pub commit_distance: f64,
    /// Release velocity (units/s) above which a release commits.
    pub commit_velocity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            provisional_distance: 50.0,
            commit_distance: 80.0,
            commit_velocity: 500.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("provisional_distance", self.provisional_distance),
            ("commit_distance", self.commit_distance),
            ("commit_velocity", self.commit_velocity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::invalid(field, "must be a positive number"));
            }
        }
        if self.provisional_distance > self.commit_distance {
            return Err(ValidationError::invalid(
                "provisional_distance",
                "must not exceed commit_distance",
            ));
        }
        Ok(())
    }
}

/// Feedback while the pointer is still down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provisional {
    /// Below the feedback threshold.
    Neutral,
    /// The card is leaning toward `direction`. `intensity` is the
    /// displacement as a fraction of the commit distance, capped at 1.0.
    Leaning { direction: Direction, intensity: f64 },
}

impl Provisional {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Provisional::Neutral => None,
            Provisional::Leaning { direction, .. } => Some(*direction),
        }
    }
}

/// Which condition decided a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitBasis {
    Distance,
    Velocity,
}

/// Outcome of a released gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Release {
    Commit {
        direction: Direction,
        basis: CommitBasis,
    },
    /// No decision; the card springs back.
    ReturnToOrigin,
}

impl Release {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Release::Commit { direction, .. } => Some(*direction),
            Release::ReturnToOrigin => None,
        }
    }
}

/// Maps gesture samples to directions.
///
/// Implementations must be pure: the same input always yields the same
/// output and nothing outside the classifier is touched.
pub trait GestureClassifier: Send + Sync {
    fn provisional(&self, sample: &GestureSample) -> Provisional;

    fn release(&self, end: &GestureEnd) -> Release;
}

/// Default classifier driven by [`Thresholds`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdClassifier {
    thresholds: Thresholds,
}

impl ThresholdClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

impl GestureClassifier for ThresholdClassifier {
    fn provisional(&self, sample: &GestureSample) -> Provisional {
        if !sample.is_finite() {
            return Provisional::Neutral;
        }
        let magnitude = sample.dx.abs().max(sample.dy.abs());
        if magnitude <= self.thresholds.provisional_distance {
            return Provisional::Neutral;
        }
        Provisional::Leaning {
            direction: axis_direction(sample.dx, sample.dy),
            intensity: (magnitude / self.thresholds.commit_distance).min(1.0),
        }
    }

    fn release(&self, end: &GestureEnd) -> Release {
        let (Some(vx), Some(vy)) = (end.vx, end.vy) else {
            return Release::ReturnToOrigin;
        };
        if ![end.dx, end.dy, vx, vy].iter().all(|v| v.is_finite()) {
            return Release::ReturnToOrigin;
        }

        let distance = end.dx.abs().max(end.dy.abs());
        if distance > self.thresholds.commit_distance {
            return Release::Commit {
                direction: axis_direction(end.dx, end.dy),
                basis: CommitBasis::Distance,
            };
        }

        // Distance alone did not decide, so velocity picks the axis.
        let speed = vx.abs().max(vy.abs());
        if speed > self.thresholds.commit_velocity {
            return Release::Commit {
                direction: axis_direction(vx, vy),
                basis: CommitBasis::Velocity,
            };
        }

        Release::ReturnToOrigin
    }
}

fn axis_direction(x: f64, y: f64) -> Direction {
    if x.abs() > y.abs() {
        if x > 0.0 {
            Direction::CommitPrivate
        } else {
            Direction::Discard
        }
    } else if y > 0.0 {
        Direction::Defer
    } else {
        Direction::CommitPublic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn end(dx: f64, dy: f64, vx: f64, vy: f64) -> GestureEnd {
        GestureEnd::new(dx, dy, vx, vy)
    }

    fn classifier() -> ThresholdClassifier {
        ThresholdClassifier::default()
    }

    #[test]
    fn large_horizontal_drag_commits_private() {
        let release = classifier().release(&end(120.0, 10.0, 50.0, 5.0));
        assert_eq!(
            release,
            Release::Commit {
                direction: Direction::CommitPrivate,
                basis: CommitBasis::Distance
            }
        );
    }

    #[test]
    fn fast_flick_commits_on_velocity_axis() {
        let release = classifier().release(&end(10.0, 10.0, 800.0, 20.0));
        assert_eq!(
            release,
            Release::Commit {
                direction: Direction::CommitPrivate,
                basis: CommitBasis::Velocity
            }
        );
    }

    #[test]
    fn small_slow_gesture_returns_to_origin() {
        assert_eq!(
            classifier().release(&end(5.0, 5.0, 5.0, 5.0)),
            Release::ReturnToOrigin
        );
    }

    #[test]
    fn distance_axis_wins_over_conflicting_velocity() {
        // Large horizontal travel, large vertical flick: distance decides.
        let release = classifier().release(&end(-150.0, 0.0, 0.0, 900.0));
        assert_eq!(release.direction(), Some(Direction::Discard));
    }

    #[test]
    fn vertical_directions() {
        assert_eq!(
            classifier().release(&end(0.0, 100.0, 0.0, 0.0)).direction(),
            Some(Direction::Defer)
        );
        assert_eq!(
            classifier().release(&end(0.0, -100.0, 0.0, 0.0)).direction(),
            Some(Direction::CommitPublic)
        );
        assert_eq!(
            classifier().release(&end(0.0, 0.0, 0.0, -700.0)).direction(),
            Some(Direction::CommitPublic)
        );
    }

    #[test]
    fn equal_magnitudes_resolve_vertically() {
        let p = classifier().provisional(&GestureSample::new(60.0, 60.0));
        assert_eq!(p.direction(), Some(Direction::Defer));
        let p = classifier().provisional(&GestureSample::new(60.0, -60.0));
        assert_eq!(p.direction(), Some(Direction::CommitPublic));
    }

    #[test]
    fn threshold_boundaries_are_exclusive() {
        assert_eq!(
            classifier().provisional(&GestureSample::new(50.0, 0.0)),
            Provisional::Neutral
        );
        assert_eq!(
            classifier().release(&end(80.0, 0.0, 500.0, 0.0)),
            Release::ReturnToOrigin
        );
        assert!(classifier().release(&end(80.5, 0.0, 0.0, 0.0)).direction().is_some());
    }

    #[test]
    fn provisional_intensity_saturates() {
        match classifier().provisional(&GestureSample::new(-400.0, 0.0)) {
            Provisional::Leaning { direction, intensity } => {
                assert_eq!(direction, Direction::Discard);
                assert_eq!(intensity, 1.0);
            }
            other => panic!("expected leaning, got {other:?}"),
        }
    }

    #[test]
    fn malformed_input_cancels() {
        assert_eq!(
            classifier().release(&end(f64::NAN, 0.0, 900.0, 0.0)),
            Release::ReturnToOrigin
        );
        assert_eq!(
            classifier().release(&GestureEnd {
                dx: 200.0,
                dy: 0.0,
                vx: None,
                vy: Some(0.0)
            }),
            Release::ReturnToOrigin
        );
        assert_eq!(
            classifier().release(&end(200.0, 0.0, f64::INFINITY, 0.0)),
            Release::ReturnToOrigin
        );
        assert_eq!(
            classifier().provisional(&GestureSample::new(f64::NAN, 300.0)),
            Provisional::Neutral
        );
    }

    #[test]
    fn custom_thresholds_apply() {
        let c = ThresholdClassifier::new(Thresholds {
            provisional_distance: 10.0,
            commit_distance: 20.0,
            commit_velocity: 100.0,
        });
        assert_eq!(
            c.release(&end(25.0, 0.0, 0.0, 0.0)).direction(),
            Some(Direction::CommitPrivate)
        );
        assert!(c.provisional(&GestureSample::new(0.0, 15.0)).direction().is_some());
    }

    #[test]
    fn thresholds_validation() {
        assert!(Thresholds::default().validate().is_ok());
        let bad = Thresholds {
            provisional_distance: 100.0,
            ..Thresholds::default()
        };
        assert!(bad.validate().is_err());
        let negative = Thresholds {
            commit_velocity: -1.0,
            ..Thresholds::default()
        };
        assert!(negative.validate().is_err());
    }

    proptest! {
        #[test]
        fn below_feedback_threshold_is_neutral(dx in -50.0f64..=50.0, dy in -50.0f64..=50.0) {
            prop_assert_eq!(
                classifier().provisional(&GestureSample::new(dx, dy)),
                Provisional::Neutral
            );
        }

        #[test]
        fn below_both_commit_thresholds_cancels(
            dx in -80.0f64..=80.0,
            dy in -80.0f64..=80.0,
            vx in -500.0f64..=500.0,
            vy in -500.0f64..=500.0,
        ) {
            prop_assert_eq!(classifier().release(&end(dx, dy, vx, vy)), Release::ReturnToOrigin);
        }

        #[test]
        fn past_commit_distance_always_commits(
            dx in 81.0f64..2000.0,
            dy in -80.0f64..=80.0,
            vx in -3000.0f64..3000.0,
            vy in -3000.0f64..3000.0,
        ) {
            let release = classifier().release(&end(dx, dy, vx, vy));
            prop_assert_eq!(release.direction(), Some(Direction::CommitPrivate));
        }
    }
}
