//! # Orientation accumulator module
//!
//! Holds the absolute orientation demanded from the gimbal. Per-cycle deltas are integrated and
//! clamped to the physical limits of each axis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use util::maths::clamp_sym;

use crate::angle_est::AngleDelta;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Physical limits of the gimbal, as absolute values either side of the default position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Units: degrees
    pub pitch_limit_deg: f64,

    /// Units: degrees
    pub yaw_limit_deg: f64,

    /// Roll is never driven by hand tracking, the limit is only carried for completeness.
    ///
    /// Units: degrees
    pub roll_limit_deg: f64,
}

/// Current orientation demand of the gimbal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GimbalState {
    /// Units: degrees
    pub pitch_deg: f64,

    /// Units: degrees
    pub yaw_deg: f64,

    /// Always zero under the current control law.
    ///
    /// Units: degrees
    pub roll_deg: f64,

    /// True if the last update saturated the pitch axis
    pub pitch_at_limit: bool,

    /// True if the last update saturated the yaw axis
    pub yaw_at_limit: bool,
}

/// Orientation accumulator
#[derive(Debug, Clone, Default)]
pub struct OrientAcc {
    params: Params,
    state: GimbalState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            pitch_limit_deg: 110.0,
            yaw_limit_deg: 35.0,
            roll_limit_deg: 75.0,
        }
    }
}

impl GimbalState {
    /// True if all axes are at the default position
    pub fn is_zero(&self) -> bool {
        self.pitch_deg == 0.0 && self.yaw_deg == 0.0 && self.roll_deg == 0.0
    }
}

impl OrientAcc {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            state: GimbalState::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> &GimbalState {
        &self.state
    }

    /// Apply a delta, enforcing the axis limits.
    ///
    /// The at-limit flags are recomputed on every call and only reflect this update.
    pub fn update(&mut self, delta: &AngleDelta) -> GimbalState {
        let (pitch_deg, pitch_at_limit) = clamp_sym(
            self.state.pitch_deg + delta.pitch_deg,
            self.params.pitch_limit_deg
        );
        let (yaw_deg, yaw_at_limit) = clamp_sym(
            self.state.yaw_deg + delta.yaw_deg,
            self.params.yaw_limit_deg
        );

        self.state = GimbalState {
            pitch_deg,
            yaw_deg,
            roll_deg: 0.0,
            pitch_at_limit,
            yaw_at_limit,
        };

        trace!("OrientAcc state: {:?}", self.state);

        self.state
    }

    /// Return to the default position.
    ///
    /// Returns `true` if the state was not already at the default position, in which case a
    /// reset command must be sent to the gimbal.
    pub fn reset(&mut self) -> bool {
        let moved = !self.state.is_zero();
        self.state = GimbalState::default();
        moved
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
