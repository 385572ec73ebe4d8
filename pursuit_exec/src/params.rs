//! # Pursuit Executable Parameters
//!
//! This module provides parameters for the pursuit executable, loaded from `pursuit_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{control_loop, gimbal_link, imu_decoder, recorder, track_coord, truth_client};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PursuitExecParams {
    /// Serial link to the gimbal controller
    pub serial: gimbal_link::Params,

    /// Control law
    #[serde(default)]
    pub control: track_coord::Params,

    /// Chest angle decoding
    #[serde(default)]
    pub imu: imu_decoder::Params,

    #[serde(default)]
    pub control_loop: control_loop::Params,

    #[serde(default)]
    pub cycle: CycleParams,

    #[serde(default)]
    pub recorder: recorder::Params,

    /// Ground truth pose helper
    #[serde(default)]
    pub truth: truth_client::Params,
}

/// Timing of the executable's main loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of cycles between two chest angle polls
    pub telemetry_poll_cycles: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.01,
            telemetry_poll_cycles: 1,
        }
    }
}

impl CycleParams {
    /// The cycle period, `None` unless it is finite and positive.
    pub fn period(&self) -> Option<Duration> {
        if self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0 {
            Some(Duration::from_secs_f64(self.cycle_period_s))
        }
        else {
            None
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use gimbal_if::{codec::Checksum, host_cmd::TrackingMode};

    #[test]
    fn test_load_params_file() {
        let params: PursuitExecParams = util::params::from_str(
            include_str!("../../params/pursuit_exec.toml")
        ).unwrap();

        assert_eq!(params.serial.baud_rate, 115200);
        assert_eq!(params.serial.checksum, Checksum([0x33, 0x34]));
        assert_eq!(params.control.default_mode, TrackingMode::Single);
        assert_eq!(params.control.angle_est.angle_threshold_deg, 8.0);
        assert_eq!(params.control.orient_acc.pitch_limit_deg, 110.0);
        assert_eq!(params.imu.outlier_threshold_cdeg, 300);
        assert_eq!(params.control_loop.body_yaw_gain, 2.5);
        assert_eq!(params.recorder.delimiter, ',');
        assert_eq!(params.truth.endpoint, "localhost:8888");
    }

    #[test]
    fn test_minimal_params() {
        let params: PursuitExecParams = util::params::from_str(r#"
            [serial]
            port = "/dev/ttyACM0"
            baud_rate = 115200
            telemetry_timeout_ms = 20
            checksum = [0x33, 0x34]
        "#).unwrap();

        assert_eq!(params.serial.port, "/dev/ttyACM0");
        assert!(!params.truth.enabled);
        assert_eq!(params.control.orient_acc.yaw_limit_deg, 35.0);
        assert_eq!(params.cycle.telemetry_poll_cycles, 1);
        assert_eq!(params.cycle.period(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_cycle_period() {
        let period = |cycle_period_s: f64| CycleParams {
            cycle_period_s,
            ..Default::default()
        }.period();

        assert_eq!(period(0.5), Some(Duration::from_millis(500)));
        assert_eq!(period(0.0), None);
        assert_eq!(period(-0.01), None);
        assert_eq!(period(f64::INFINITY), None);
        assert_eq!(period(f64::NAN), None);
    }
}
