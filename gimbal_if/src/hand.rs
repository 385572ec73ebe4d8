//! # Hand Tracking Interface
//!
//! This module defines the frames produced by the hand tracker. Only the numeric contract of the
//! tracker is captured here, the tracker's own lifecycle is managed elsewhere.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single tracked hand in a frame.
///
/// Frame: hand tracker, +Y points away from the sensor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    /// Position of the centre of the palm.
    ///
    /// Units: millimeters
    pub palm_position_mm: Vector3<f64>,

    /// Velocity of the centre of the palm.
    ///
    /// Units: millimeters/second
    #[serde(default = "Vector3::zeros")]
    pub palm_velocity_mms: Vector3<f64>,

    /// Position of the wrist.
    ///
    /// Units: millimeters
    #[serde(default = "Vector3::zeros")]
    pub wrist_position_mm: Vector3<f64>,

    /// Which hand this is
    pub handedness: Handedness,
}

/// All hands seen by the tracker during one tracking frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    /// Hands in the order the tracker reported them
    #[serde(default)]
    pub hands: Vec<HandSample>,

    /// Current tracker frame rate.
    ///
    /// Units: frames/second
    #[serde(default)]
    pub frame_rate_hz: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HandSample {
    /// Create a new sample at rest, with the wrist coincident with the palm.
    pub fn new(palm_position_mm: Vector3<f64>, handedness: Handedness) -> Self {
        Self {
            palm_position_mm,
            palm_velocity_mms: Vector3::zeros(),
            wrist_position_mm: palm_position_mm,
            handedness,
        }
    }

    /// Palm speed, the norm of the palm velocity.
    ///
    /// Units: millimeters/second
    pub fn speed_mms(&self) -> f64 {
        self.palm_velocity_mms.norm()
    }

    /// Distance between the palm and the wrist.
    ///
    /// Units: meters
    pub fn palm_wrist_dist_m(&self) -> f64 {
        (self.palm_position_mm - self.wrist_position_mm).norm() / 1000.0
    }
}

impl HandFrame {
    /// Number of hands in this frame
    pub fn num_hands(&self) -> usize {
        self.hands.len()
    }

    /// Returns the first two hands if they have opposite handedness, ordered `(left, right)`.
    pub fn opposite_pair(&self) -> Option<(&HandSample, &HandSample)> {
        match (self.hands.get(0), self.hands.get(1)) {
            (Some(a), Some(b)) => match (a.handedness, b.handedness) {
                (Handedness::Left, Handedness::Right) => Some((a, b)),
                (Handedness::Right, Handedness::Left) => Some((b, a)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Handedness {
    pub fn is_left(&self) -> bool {
        *self == Handedness::Left
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
