//! # Angle estimation module
//!
//! Converts a palm position into the direction the gimbal should step in this cycle. The raw
//! pointing angles are computed from the palm position, snapped to zero inside a conical dead-zone
//! and then replaced by a fixed step, so the output is really a direction per axis rather than a
//! magnitude.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use util::maths::{dead_zone, sign_step};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for angle estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Half angle of the central dead-zone cone.
    ///
    /// Units: degrees
    pub angle_threshold_deg: f64,

    /// Step applied to an axis each cycle the hand is outside the dead-zone.
    ///
    /// Units: degrees/cycle
    pub angular_speed_deg: f64,

    /// In dual hand mode, horizontal angles beyond this threshold double the horizontal step.
    ///
    /// Units: degrees
    pub dual_wide_threshold_deg: f64,
}

/// Angle estimator.
#[derive(Debug, Clone, Default)]
pub struct AngleEst {
    params: Params,
}

/// Per-cycle angular deltas to apply to the gimbal.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AngleDelta {
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

/// Result of an estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleEstimate {
    /// Raw vertical pointing angle, before the dead-zone.
    ///
    /// Units: degrees
    pub vertical_deg: f64,

    /// Raw horizontal pointing angle, before the dead-zone.
    ///
    /// Units: degrees
    pub horizontal_deg: f64,

    /// Quantised step for this cycle
    pub delta: AngleDelta,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AngleEstError {
    #[error("Degenerate palm sample {0:?}, the distance axis must be finite and non-zero")]
    DegenerateSample([f64; 3]),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            angle_threshold_deg: 8.0,
            angular_speed_deg: 1.0,
            dual_wide_threshold_deg: 35.0,
        }
    }
}

impl AngleEst {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Estimate the step for a single tracked palm.
    pub fn estimate_single(
        &self,
        palm_mm: &Vector3<f64>,
        invert_axis: bool
    ) -> Result<AngleEstimate, AngleEstError> {
        let (vertical_deg, horizontal_deg) = pointing_angles(palm_mm, invert_axis)?;

        Ok(AngleEstimate {
            vertical_deg,
            horizontal_deg,
            delta: AngleDelta {
                pitch_deg: self.quantise(vertical_deg, self.params.angular_speed_deg),
                yaw_deg: self.quantise(horizontal_deg, self.params.angular_speed_deg),
            }
        })
    }

    /// Estimate the step for the midpoint of two palms.
    ///
    /// Wide horizontal sweeps (beyond `dual_wide_threshold_deg`) step twice as fast horizontally.
    pub fn estimate_dual(
        &self,
        left_mm: &Vector3<f64>,
        right_mm: &Vector3<f64>,
        invert_axis: bool
    ) -> Result<AngleEstimate, AngleEstError> {
        let mid = midpoint(left_mm, right_mm);
        let (vertical_deg, horizontal_deg) = pointing_angles(&mid, invert_axis)?;

        let mut h_speed = self.params.angular_speed_deg;
        if horizontal_deg.abs() > self.params.dual_wide_threshold_deg {
            h_speed *= 2.0;
        }

        Ok(AngleEstimate {
            vertical_deg,
            horizontal_deg,
            delta: AngleDelta {
                pitch_deg: self.quantise(vertical_deg, self.params.angular_speed_deg),
                yaw_deg: self.quantise(horizontal_deg, h_speed),
            }
        })
    }

    fn quantise(&self, angle_deg: f64, step_deg: f64) -> f64 {
        sign_step(dead_zone(angle_deg, self.params.angle_threshold_deg), step_deg)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Midpoint between two palms.
pub fn midpoint(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    (a + b) / 2.0
}

/// Compute the `(vertical, horizontal)` pointing angles of a palm position.
///
/// Units: degrees
pub fn pointing_angles(
    palm_mm: &Vector3<f64>,
    invert_axis: bool
) -> Result<(f64, f64), AngleEstError> {
    if palm_mm.y == 0.0 || !palm_mm.iter().all(|c| c.is_finite()) {
        return Err(AngleEstError::DegenerateSample([palm_mm.x, palm_mm.y, palm_mm.z]))
    }

    let sign = if invert_axis { 1.0 } else { -1.0 };

    let vertical_deg = (sign * palm_mm.z / palm_mm.y).atan().to_degrees();
    let horizontal_deg = (sign * palm_mm.x / palm_mm.y).atan().to_degrees();

    Ok((vertical_deg, horizontal_deg))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_hand_step() {
        let est = AngleEst::new(Params::default());

        let e = est.estimate_single(&Vector3::new(0.0, 500.0, 200.0), true).unwrap();
        assert_relative_eq!(e.vertical_deg, 21.801, epsilon = 1e-3);
        assert_eq!(e.delta, AngleDelta { pitch_deg: 1.0, yaw_deg: 0.0 });

        // Not inverting flips the direction
        let e = est.estimate_single(&Vector3::new(0.0, 500.0, 200.0), false).unwrap();
        assert_eq!(e.delta.pitch_deg, -1.0);

        // Magnitude of the angle does not matter once outside the dead-zone
        let e = est.estimate_single(&Vector3::new(-400.0, 100.0, 0.0), true).unwrap();
        assert_eq!(e.delta, AngleDelta { pitch_deg: 0.0, yaw_deg: -1.0 });
    }

    #[test]
    fn test_dead_zone() {
        let est = AngleEst::new(Params::default());

        // Sweep positions whose angles are all inside the 8 degree cone
        for i in -13..=13 {
            let offset = i as f64 * 5.0;
            let e = est.estimate_single(&Vector3::new(offset, 500.0, -offset), true).unwrap();
            assert!(e.vertical_deg.abs() < 8.0 && e.horizontal_deg.abs() < 8.0);
            assert_eq!(e.delta, AngleDelta::default());
        }
    }

    #[test]
    fn test_dual_hand_wide_sweep() {
        let est = AngleEst::new(Params::default());

        // Midpoint (400, 300, 0) is about 53 degrees to the side
        let e = est.estimate_dual(
            &Vector3::new(300.0, 300.0, 0.0),
            &Vector3::new(500.0, 300.0, 0.0),
            true
        ).unwrap();
        assert_eq!(e.delta, AngleDelta { pitch_deg: 0.0, yaw_deg: 2.0 });

        // Midpoint (100, 300, 200), 18 degrees to the side, 34 degrees up
        let e = est.estimate_dual(
            &Vector3::new(0.0, 300.0, 200.0),
            &Vector3::new(200.0, 300.0, 200.0),
            true
        ).unwrap();
        assert_eq!(e.delta, AngleDelta { pitch_deg: 1.0, yaw_deg: 1.0 });
    }

    #[test]
    fn test_degenerate() {
        let est = AngleEst::new(Params::default());

        assert!(matches!(
            est.estimate_single(&Vector3::new(10.0, 0.0, 10.0), true),
            Err(AngleEstError::DegenerateSample(_))
        ));
        assert!(matches!(
            est.estimate_dual(
                &Vector3::new(10.0, -100.0, 10.0),
                &Vector3::new(10.0, 100.0, 10.0),
                true
            ),
            Err(AngleEstError::DegenerateSample(_))
        ));
        assert!(est.estimate_single(&Vector3::new(std::f64::NAN, 1.0, 0.0), true).is_err());
    }
}
