//! Implementations for the TrackCoord state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::fmt;
use log::{debug, info, trace};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{Params, TrackCoordError};
use crate::{
    angle_est::{midpoint, AngleEst, AngleEstimate},
    orient_acc::{GimbalState, OrientAcc},
    sph_proj::SphProj,
};
use gimbal_if::{
    codec::GimbalCmd,
    hand::HandFrame,
    host_cmd::TrackingMode,
};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracking mode coordinator state
#[derive(Default)]
pub struct TrackCoord {
    params: Params,

    angle_est: AngleEst,
    orient_acc: OrientAcc,
    sph_proj: SphProj,

    pub(crate) state: ControlLoopState,

    /// Set on the first frame without hands, cleared as soon as hands are back.
    track_lost: bool,
}

/// State shared with the presentation layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlLoopState {
    pub mode: TrackingMode,
    pub invert_axis: bool,
    pub enable_serial: bool,
    pub status: TrackingStatus,

    /// Speed of the tracked palm, or the mean of both palms in dual mode.
    ///
    /// Units: millimeters/second
    pub palm_speed_mms: f64,

    /// Latest tracker frame rate.
    ///
    /// Units: frames/second
    pub frame_rate_hz: f64,

    /// Latest projected offset in the chest frame.
    ///
    /// Units: meters
    pub offset_m: Option<Vector3<f64>>,
}

/// Output of processing one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputData {
    /// Command to send to the gimbal, if any
    pub cmd: Option<GimbalCmd>,

    /// Projected offset in the chest frame.
    ///
    /// Units: meters
    pub offset_m: Option<Vector3<f64>>,

    /// Offset translated by the chest offset, the point handed to the presentation layer.
    ///
    /// Units: meters
    pub target_m: Option<Vector3<f64>>,

    /// Distance between palm and wrist of the tracked hand, the left one in dual mode.
    ///
    /// Units: meters
    pub palm_wrist_dist_m: Option<f64>,
}

/// Status report for TrackCoord processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub status: TrackingStatus,
    pub gimbal: GimbalState,
    pub estimate: Option<AngleEstimate>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of the last processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackingStatus {
    /// No frame processed yet
    Idle,
    SingleHand,
    BothHands,
    NoHands,

    /// Hands present but not usable in the current mode
    NoActionableSample,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrackingStatus {
    fn default() -> Self {
        TrackingStatus::Idle
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackingStatus::Idle => "Idle",
            TrackingStatus::SingleHand => "Single hand detected",
            TrackingStatus::BothHands => "Both hands detected",
            TrackingStatus::NoHands => "No hands detected",
            TrackingStatus::NoActionableSample => "No actionable sample",
        };
        write!(f, "{}", s)
    }
}

impl State for TrackCoord {
    type InitData = Params;
    type InitError = TrackCoordError;

    type InputData = HandFrame;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = TrackCoordError;

    /// Initialise the coordinator from already loaded parameters.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        init_data.validate()?;

        *self = TrackCoord::new(init_data);

        debug!("TrackCoord initialised in {:?} mode", self.state.mode);

        Ok(())
    }

    /// Process one hand tracking frame.
    ///
    /// A frame whose palm sample is degenerate is skipped with an error, leaving the gimbal state
    /// untouched.
    fn proc(&mut self, frame: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.state.frame_rate_hz = frame.frame_rate_hz;

        if frame.num_hands() == 0 {
            return Ok(self.proc_no_hands())
        }

        self.track_lost = false;

        let mode = self.state.mode;
        let (status, estimate, palm_mm, hand, speed_mms) = match mode {
            TrackingMode::Single if frame.num_hands() == 1 => {
                let hand = &frame.hands[0];
                let est = self.angle_est
                    .estimate_single(&hand.palm_position_mm, self.state.invert_axis)
                    .map_err(TrackCoordError::FrameSkipped)?;

                (TrackingStatus::SingleHand, est, hand.palm_position_mm, hand, hand.speed_mms())
            },
            TrackingMode::Dual => match frame.opposite_pair() {
                Some((left, right)) => {
                    let est = self.angle_est
                        .estimate_dual(
                            &left.palm_position_mm,
                            &right.palm_position_mm,
                            self.state.invert_axis
                        )
                        .map_err(TrackCoordError::FrameSkipped)?;

                    let mid = midpoint(&left.palm_position_mm, &right.palm_position_mm);
                    let speed = (left.speed_mms() + right.speed_mms()) / 2.0;
                    (TrackingStatus::BothHands, est, mid, left, speed)
                },
                None => return Ok(self.proc_not_actionable()),
            },
            _ => return Ok(self.proc_not_actionable()),
        };

        trace!("Estimate: {:?}", estimate);

        let gimbal = self.orient_acc.update(&estimate.delta);

        let offset_m = self.sph_proj.project(&gimbal, &palm_mm);
        let target_m = offset_m + self.sph_proj.chest_translation();

        self.set_status(status);
        self.state.palm_speed_mms = speed_mms;
        self.state.offset_m = Some(offset_m);

        let output = OutputData {
            cmd: Some(GimbalCmd::SetAngles {
                pitch_deg: gimbal.pitch_deg as f32,
                roll_deg: gimbal.roll_deg as f32,
                yaw_deg: gimbal.yaw_deg as f32,
            }),
            offset_m: Some(offset_m),
            target_m: Some(target_m),
            palm_wrist_dist_m: Some(hand.palm_wrist_dist_m()),
        };
        let report = StatusReport {
            status,
            gimbal,
            estimate: Some(estimate),
        };

        Ok((output, report))
    }
}

impl TrackCoord {
    /// Create a coordinator without validating the parameters.
    pub fn new(params: Params) -> Self {
        let state = ControlLoopState {
            mode: params.default_mode,
            invert_axis: params.invert_axis,
            enable_serial: params.enable_serial,
            ..Default::default()
        };

        Self {
            angle_est: AngleEst::new(params.angle_est.clone()),
            orient_acc: OrientAcc::new(params.orient_acc.clone()),
            sph_proj: SphProj::new(params.sph_proj.clone()),
            params,
            state,
            track_lost: false,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> &ControlLoopState {
        &self.state
    }

    pub fn gimbal(&self) -> &GimbalState {
        self.orient_acc.state()
    }

    /// Return the gimbal to its default position.
    ///
    /// Returns the reset command to send, or `None` if the gimbal was already there.
    pub fn reset_position(&mut self) -> Option<GimbalCmd> {
        if self.orient_acc.reset() {
            info!("Gimbal position reset");
            Some(GimbalCmd::Reset)
        }
        else {
            None
        }
    }

    pub fn set_tracking_mode(&mut self, mode: TrackingMode) {
        if mode != self.state.mode {
            info!("Tracking mode set to {:?}", mode);
        }
        self.state.mode = mode;
    }

    pub fn set_invert_axis(&mut self, invert_axis: bool) {
        self.state.invert_axis = invert_axis;
    }

    /// Set the enable serial toggle.
    ///
    /// Disabling communication returns the gimbal to its default position first, the returned
    /// reset command must be sent.
    pub fn set_enable_serial(&mut self, enable: bool) -> Option<GimbalCmd> {
        let was_enabled = self.state.enable_serial;
        self.state.enable_serial = enable;

        match (was_enabled, enable) {
            (true, false) => {
                info!("Serial communication disabled");
                self.reset_position()
            },
            (false, true) => {
                info!("Serial communication enabled");
                None
            },
            _ => None
        }
    }

    fn proc_no_hands(&mut self) -> (OutputData, StatusReport) {
        self.set_status(TrackingStatus::NoHands);

        let mut output = OutputData::default();

        if !self.track_lost {
            self.track_lost = true;
            output.cmd = self.reset_position();
        }

        (output, self.idle_report())
    }

    fn proc_not_actionable(&mut self) -> (OutputData, StatusReport) {
        self.set_status(TrackingStatus::NoActionableSample);
        (OutputData::default(), self.idle_report())
    }

    fn idle_report(&self) -> StatusReport {
        StatusReport {
            status: self.state.status,
            gimbal: *self.orient_acc.state(),
            estimate: None,
        }
    }

    fn set_status(&mut self, status: TrackingStatus) {
        if status != self.state.status {
            debug!("Tracking status: {}", status);
        }
        self.state.status = status;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use gimbal_if::hand::{HandSample, Handedness};

    fn frame(hands: &[(f64, f64, f64, Handedness)]) -> HandFrame {
        HandFrame {
            hands: hands
                .iter()
                .map(|(x, y, z, h)| HandSample::new(Vector3::new(*x, *y, *z), *h))
                .collect(),
            frame_rate_hz: 110.0,
        }
    }

    fn coord(mode: TrackingMode) -> TrackCoord {
        TrackCoord::new(Params {
            default_mode: mode,
            invert_axis: true,
            enable_serial: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_single_hand() {
        let mut tc = coord(TrackingMode::Single);

        let (out, report) = tc.proc(&frame(&[(0.0, 500.0, 200.0, Handedness::Right)])).unwrap();

        assert_eq!(report.status, TrackingStatus::SingleHand);
        assert_eq!(tc.gimbal().pitch_deg, 1.0);
        assert_eq!(tc.gimbal().yaw_deg, 0.0);
        assert!(!tc.gimbal().pitch_at_limit && !tc.gimbal().yaw_at_limit);
        assert_eq!(
            out.cmd,
            Some(GimbalCmd::SetAngles { pitch_deg: 1.0, roll_deg: 0.0, yaw_deg: 0.0 })
        );

        let offset = out.offset_m.unwrap();
        assert_relative_eq!(offset.z, 0.5 * 1f64.to_radians().cos(), epsilon = 1e-12);
        assert_relative_eq!(offset.y, -0.5 * 1f64.to_radians().sin(), epsilon = 1e-12);
        assert_eq!(out.target_m, Some(offset));
        assert_eq!(tc.state().frame_rate_hz, 110.0);
        assert_eq!(tc.state().status.to_string(), "Single hand detected");
    }

    #[test]
    fn test_no_hands_resets_once() {
        let mut tc = coord(TrackingMode::Single);

        for _ in 0..3 {
            tc.proc(&frame(&[(0.0, 500.0, 200.0, Handedness::Left)])).unwrap();
        }
        assert_eq!(tc.gimbal().pitch_deg, 3.0);

        let (first, _) = tc.proc(&frame(&[])).unwrap();
        let (second, report) = tc.proc(&frame(&[])).unwrap();

        assert_eq!(first.cmd, Some(GimbalCmd::Reset));
        assert_eq!(second.cmd, None);
        assert_eq!(report.status, TrackingStatus::NoHands);
        assert!(tc.gimbal().is_zero());

        // Hands back then lost again, nothing to reset from the default position
        tc.proc(&frame(&[(0.0, 500.0, 0.0, Handedness::Left)])).unwrap();
        let (out, _) = tc.proc(&frame(&[])).unwrap();
        assert_eq!(out.cmd, None);
    }

    #[test]
    fn test_mode_mismatch() {
        // Two hands in single mode
        let mut tc = coord(TrackingMode::Single);
        let (out, report) = tc.proc(&frame(&[
            (0.0, 500.0, 200.0, Handedness::Left),
            (0.0, 500.0, 200.0, Handedness::Right),
        ])).unwrap();
        assert_eq!(out, OutputData::default());
        assert_eq!(report.status, TrackingStatus::NoActionableSample);
        assert!(tc.gimbal().is_zero());

        // Dual mode with the same handedness twice
        let mut tc = coord(TrackingMode::Dual);
        for _ in 0..2 {
            tc.proc(&frame(&[
                (0.0, 300.0, 200.0, Handedness::Left),
                (200.0, 300.0, 200.0, Handedness::Right),
            ])).unwrap();
        }
        let before = *tc.gimbal();

        let (out, report) = tc.proc(&frame(&[
            (0.0, 500.0, 200.0, Handedness::Right),
            (0.0, 500.0, 200.0, Handedness::Right),
        ])).unwrap();
        assert_eq!(out.cmd, None);
        assert_eq!(report.status, TrackingStatus::NoActionableSample);
        assert_eq!(*tc.gimbal(), before);

        // Dual mode with one hand
        let (out, _) = tc.proc(&frame(&[(0.0, 500.0, 200.0, Handedness::Right)])).unwrap();
        assert_eq!(out.cmd, None);
        assert_eq!(*tc.gimbal(), before);
    }

    #[test]
    fn test_dual_hand() {
        let mut tc = coord(TrackingMode::Dual);

        let mut f = frame(&[
            (500.0, 300.0, 0.0, Handedness::Right),
            (300.0, 300.0, 0.0, Handedness::Left),
        ]);
        f.hands[0].palm_velocity_mms = Vector3::new(0.0, 30.0, 40.0);

        let (out, report) = tc.proc(&f).unwrap();

        assert_eq!(report.status, TrackingStatus::BothHands);
        assert_eq!(tc.gimbal().yaw_deg, 2.0);
        assert_eq!(tc.gimbal().pitch_deg, 0.0);
        assert_relative_eq!(tc.state().palm_speed_mms, 25.0);
        assert!(out.offset_m.is_some());
    }

    #[test]
    fn test_degenerate_frame_skipped() {
        let mut tc = coord(TrackingMode::Single);

        let res = tc.proc(&frame(&[(10.0, 0.0, 10.0, Handedness::Left)]));
        assert!(matches!(res, Err(TrackCoordError::FrameSkipped(_))));
        assert!(tc.gimbal().is_zero());
    }

    #[test]
    fn test_enable_serial_toggle() {
        let mut tc = coord(TrackingMode::Single);

        // Nothing to reset from the default position
        assert_eq!(tc.set_enable_serial(false), None);
        assert_eq!(tc.set_enable_serial(true), None);

        tc.proc(&frame(&[(0.0, 500.0, 200.0, Handedness::Left)])).unwrap();
        assert_eq!(tc.set_enable_serial(true), None);
        assert_eq!(tc.set_enable_serial(false), Some(GimbalCmd::Reset));
        assert!(tc.gimbal().is_zero());
        assert!(!tc.state().enable_serial);
    }

    #[test]
    fn test_validate() {
        let mut params = Params::default();
        assert!(params.validate().is_ok());

        params.orient_acc.yaw_limit_deg = 0.0;
        assert!(matches!(params.validate(), Err(TrackCoordError::InvalidParam(_))));

        params.orient_acc.yaw_limit_deg = 35.0;
        params.angle_est.angle_threshold_deg = std::f64::NAN;
        assert!(params.validate().is_err());
    }
}
