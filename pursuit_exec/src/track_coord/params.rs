//! Parameters structure for TrackCoord

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{angle_est, orient_acc, sph_proj};
use gimbal_if::host_cmd::TrackingMode;
use super::TrackCoordError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Tracking Mode Coordination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Params {
    /// Tracking mode selected at start-up
    #[serde(default)]
    pub default_mode: TrackingMode,

    /// Initial value of the invert axis toggle
    #[serde(default)]
    pub invert_axis: bool,

    /// Initial value of the enable serial toggle
    #[serde(default)]
    pub enable_serial: bool,

    #[serde(default)]
    pub angle_est: angle_est::Params,

    #[serde(default)]
    pub orient_acc: orient_acc::Params,

    #[serde(default)]
    pub sph_proj: sph_proj::Params,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are physically meaningful.
    pub fn validate(&self) -> Result<(), TrackCoordError> {
        let positive = [
            ("angle_est.angular_speed_deg", self.angle_est.angular_speed_deg),
            ("orient_acc.pitch_limit_deg", self.orient_acc.pitch_limit_deg),
            ("orient_acc.yaw_limit_deg", self.orient_acc.yaw_limit_deg),
        ];
        let non_negative = [
            ("angle_est.angle_threshold_deg", self.angle_est.angle_threshold_deg),
            ("angle_est.dual_wide_threshold_deg", self.angle_est.dual_wide_threshold_deg),
            ("orient_acc.roll_limit_deg", self.orient_acc.roll_limit_deg),
        ];

        for (name, value) in positive.iter() {
            if !(*value > 0.0) {
                return Err(TrackCoordError::InvalidParam(
                    format!("{} must be positive, got {}", name, value)
                ))
            }
        }
        for (name, value) in non_negative.iter() {
            if !(*value >= 0.0) {
                return Err(TrackCoordError::InvalidParam(
                    format!("{} must not be negative, got {}", name, value)
                ))
            }
        }

        Ok(())
    }
}
