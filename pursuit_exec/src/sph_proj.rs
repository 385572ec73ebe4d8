//! # Spherical projection module
//!
//! Maps the gimbal orientation and the palm distance back into an offset in the chest frame, so
//! the virtual hand can be placed where the real hand is.
//!
//! Chest frame: +Z forward, +Y up, +X right. Units: meters.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::orient_acc::GimbalState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Params {
    /// Height offset between the headset and the gimbal base.
    ///
    /// Units: meters
    pub chest_offset_m: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SphProj {
    params: Params,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SphProj {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Project the gimbal state and the palm position into an offset in the chest frame.
    ///
    /// When an axis is saturated the gimbal can no longer follow the hand along it, so the palm
    /// coordinate along that axis is added directly.
    pub fn project(&self, state: &GimbalState, palm_mm: &Vector3<f64>) -> Vector3<f64> {
        let dist_m = palm_mm.y / 1000.0;
        let pitch_rad = (-state.pitch_deg).to_radians();
        let yaw_rad = state.yaw_deg.to_radians();

        let mut offset = Vector3::new(
            -dist_m * pitch_rad.cos() * yaw_rad.sin(),
            dist_m * pitch_rad.sin(),
            dist_m * pitch_rad.cos() * yaw_rad.cos(),
        );

        if state.pitch_at_limit {
            offset.y += palm_mm.z / 1000.0;
        }
        if state.yaw_at_limit {
            offset.x -= palm_mm.x / 1000.0;
        }

        offset
    }

    /// Translation from the gimbal base to the chest reference point, applied by the caller.
    pub fn chest_translation(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, self.params.chest_offset_m)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_project() {
        let proj = SphProj::new(Params { chest_offset_m: 0.2 });
        let palm = Vector3::new(30.0, 400.0, -50.0);

        // Straight ahead
        let o = proj.project(&GimbalState::default(), &palm);
        assert_relative_eq!(o.x, 0.0);
        assert_relative_eq!(o.y, 0.0);
        assert_relative_eq!(o.z, 0.4);

        // Pitching by 90 degrees moves the hand onto the vertical axis
        let s = GimbalState { pitch_deg: 90.0, ..Default::default() };
        let o = proj.project(&s, &palm);
        assert_relative_eq!(o.y, -0.4, epsilon = 1e-12);
        assert_relative_eq!(o.z, 0.0, epsilon = 1e-12);

        // Yawed by 30 degrees
        let s = GimbalState { yaw_deg: 30.0, ..Default::default() };
        let o = proj.project(&s, &palm);
        assert_relative_eq!(o.x, -0.2, epsilon = 1e-12);
        assert_relative_eq!(o.z, 0.4 * 30f64.to_radians().cos(), epsilon = 1e-12);

        assert_eq!(proj.chest_translation(), Vector3::new(0.0, 0.0, 0.2));
    }

    #[test]
    fn test_limit_correction() {
        let proj = SphProj::default();
        let palm = Vector3::new(30.0, 400.0, -50.0);

        let free = GimbalState { pitch_deg: 110.0, yaw_deg: 35.0, ..Default::default() };
        let saturated = GimbalState { pitch_at_limit: true, yaw_at_limit: true, ..free };

        let a = proj.project(&free, &palm);
        let b = proj.project(&saturated, &palm);

        assert_relative_eq!(b.y - a.y, -0.05, epsilon = 1e-12);
        assert_relative_eq!(b.x - a.x, -0.03, epsilon = 1e-12);
        assert_relative_eq!(b.z, a.z);
    }
}
