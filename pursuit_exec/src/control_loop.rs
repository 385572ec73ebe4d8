//! # Control loop
//!
//! Owns every stateful part of the system and routes host commands through them. This is the
//! programmatic boundary the presentation layer talks to: it feeds hand frames and key states in,
//! and reads the gimbal orientation, the hand target and the status back out.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use gimbal_if::{
    codec::GimbalCmd,
    hand::HandFrame,
    host_cmd::{HostCmd, TrackingMode},
};
use util::{archive::ExportSink, module::State, time::seconds_since};

use crate::{
    gimbal_link::{GimbalLink, SerialTransport},
    imu_decoder::{self, ChestTracker},
    recorder::{self, Recorder},
    track_coord::{ControlLoopState, TrackCoord, TrackCoordError},
    truth_client::TruthClient,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Gain from an accepted chest angle change to the rotation of the reference frame.
    ///
    /// Units: degrees of rotation per degree of chest angle
    pub body_yaw_gain: f64,
}

/// Fires once on each false to true transition of a level.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeTrigger {
    level: bool,
}

pub struct ControlLoop<T: SerialTransport> {
    params: Params,

    track_coord: TrackCoord,
    link: GimbalLink<T>,
    chest: ChestTracker,
    recorder: Recorder,
    sink: Box<dyn ExportSink>,
    truth: Option<TruthClient>,

    reset_key: EdgeTrigger,
    record_key: EdgeTrigger,
    home_key: EdgeTrigger,

    start_time: DateTime<Utc>,

    /// Accumulated rotation of the reference frame about the vertical axis.
    ///
    /// Units: degrees
    referential_yaw_deg: f64,

    /// Latest hand target, rotated into the reference frame.
    ///
    /// Units: meters
    target_m: Option<Vector3<f64>>,

    /// Units: meters
    palm_wrist_dist_m: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            body_yaw_gain: 2.5,
        }
    }
}

impl EdgeTrigger {
    /// Update with the current level, returning `true` on a rising edge.
    pub fn update(&mut self, level: bool) -> bool {
        let rising = level && !self.level;
        self.level = level;
        rising
    }
}

impl<T: SerialTransport> ControlLoop<T> {
    /// Assemble the control loop. The link may or may not be open.
    pub fn new(
        params: Params,
        track_coord: TrackCoord,
        link: GimbalLink<T>,
        imu_params: imu_decoder::Params,
        recorder_params: recorder::Params,
        sink: Box<dyn ExportSink>,
    ) -> Self {
        Self {
            params,
            track_coord,
            link,
            chest: ChestTracker::new(imu_params),
            recorder: Recorder::new(recorder_params),
            sink,
            truth: None,
            reset_key: EdgeTrigger::default(),
            record_key: EdgeTrigger::default(),
            home_key: EdgeTrigger::default(),
            start_time: Utc::now(),
            referential_yaw_deg: 0.0,
            target_m: None,
            palm_wrist_dist_m: None,
        }
    }

    /// Attach a connected ground truth client, used while recording.
    pub fn set_truth_client(&mut self, client: Option<TruthClient>) {
        self.truth = client;
    }

    /// Apply one host command.
    pub fn apply(&mut self, cmd: HostCmd) {
        match cmd {
            HostCmd::Frame(ref frame) => self.on_frame(frame),
            HostCmd::Keys { reset, record, home } => self.on_keys(reset, record, home),
            HostCmd::SetTrackingMode(mode) => self.set_tracking_mode(mode),
            HostCmd::SetEnableSerial(enable) => self.set_enable_serial(enable),
            HostCmd::SetInvertAxis(invert) => self.set_invert_axis(invert),
        }
    }

    /// Process one hand tracking frame.
    pub fn on_frame(&mut self, frame: &HandFrame) {
        let (output, report) = match self.track_coord.proc(frame) {
            Ok(o) => o,
            Err(TrackCoordError::FrameSkipped(e)) => {
                debug!("Frame skipped: {}", e);
                return
            },
            Err(e) => {
                warn!("Could not process hand frame: {}", e);
                return
            }
        };

        trace!("TrackCoord status: {:?}", report);

        if let Some(cmd) = output.cmd {
            self.dispatch(&cmd);
        }

        if output.palm_wrist_dist_m.is_some() {
            self.palm_wrist_dist_m = output.palm_wrist_dist_m;
        }

        if let Some(target) = output.target_m {
            let rot = Rotation3::from_axis_angle(
                &Vector3::y_axis(),
                self.referential_yaw_deg.to_radians()
            );
            let target = rot * target;
            self.target_m = Some(target);

            if self.recorder.is_recording() {
                let truth = self.query_truth();
                self.recorder.record(
                    seconds_since(&self.start_time),
                    &target,
                    self.track_coord.state().palm_speed_mms,
                    truth
                );
            }
        }
    }

    /// Process the current state of the host keys.
    ///
    /// Every key acts on its key-down transition only. The reset key needs gimbal communication
    /// to be enabled and the link to be open.
    pub fn on_keys(&mut self, reset: bool, record: bool, home: bool) {
        if self.reset_key.update(reset) {
            if self.enable_serial() && self.link.is_open() {
                self.reset_position();
            }
            else {
                warn!("Reset ignored, gimbal communication is disabled or the link is not open");
            }
        }

        if self.record_key.update(record) {
            if self.recorder.is_recording() {
                self.stop_recording();
            }
            else {
                self.recorder.start(seconds_since(&self.start_time));
            }
        }

        if self.home_key.update(home) {
            self.home_truth();
        }
    }

    /// Send the pose helper's arm back to its initial pose. Failures are logged and ignored.
    pub fn home_truth(&mut self) {
        match self.truth {
            Some(ref mut client) => match client.home() {
                Ok(()) => info!("Pose helper sent home"),
                Err(e) => warn!("Could not send the pose helper home: {}", e),
            },
            None => debug!("Home ignored, no pose helper connected"),
        }
    }

    /// Poll the chest angle from the gimbal telemetry.
    ///
    /// Returns the rotation applied to the reference frame, or `None` if no telemetry could be
    /// read.
    pub fn poll_chest(&mut self) -> Option<f64> {
        if !self.track_coord.state().enable_serial || !self.link.is_open() {
            return None
        }

        let response = match self.link.query_telemetry() {
            Ok(r) => r,
            Err(e) => {
                warn!("Telemetry poll failed: {}", e);
                return None
            }
        };

        let reading = self.chest.update(&response);
        let rotation_deg = -(reading.delta_cdeg as f64 / 100.0) * self.params.body_yaw_gain;
        self.referential_yaw_deg += rotation_deg;

        Some(rotation_deg)
    }

    /// Return the gimbal to its default position.
    pub fn reset_position(&mut self) {
        if let Some(cmd) = self.track_coord.reset_position() {
            self.dispatch(&cmd);
        }
    }

    /// Stop a running recording and export it, called on key press and on shutdown.
    pub fn stop_recording(&mut self) {
        if !self.recorder.is_recording() {
            return
        }

        if let Err(e) = self.recorder.stop_and_export(self.sink.as_mut()) {
            warn!("Could not export the recording: {}", e);
        }
    }

    /// Export any running recording, switch the pose helper off and close the link.
    pub fn shutdown(&mut self) {
        self.stop_recording();

        if let Some(ref mut client) = self.truth {
            if let Err(e) = client.enable(false) {
                warn!("Could not switch the pose helper off: {}", e);
            }
        }

        self.link.close();
    }

    pub fn pitch(&self) -> f64 {
        self.track_coord.gimbal().pitch_deg
    }

    pub fn yaw(&self) -> f64 {
        self.track_coord.gimbal().yaw_deg
    }

    pub fn roll(&self) -> f64 {
        self.track_coord.gimbal().roll_deg
    }

    /// Units: millimeters/second
    pub fn speed(&self) -> f64 {
        self.track_coord.state().palm_speed_mms
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.track_coord.state().mode
    }

    pub fn set_tracking_mode(&mut self, mode: TrackingMode) {
        self.track_coord.set_tracking_mode(mode)
    }

    pub fn enable_serial(&self) -> bool {
        self.track_coord.state().enable_serial
    }

    /// Switching communication off returns the gimbal to its default position first.
    pub fn set_enable_serial(&mut self, enable: bool) {
        if let Some(cmd) = self.track_coord.set_enable_serial(enable) {
            self.dispatch(&cmd);
        }
    }

    pub fn invert_axis(&self) -> bool {
        self.track_coord.state().invert_axis
    }

    pub fn set_invert_axis(&mut self, invert: bool) {
        self.track_coord.set_invert_axis(invert)
    }

    pub fn status(&self) -> String {
        self.track_coord.state().status.to_string()
    }

    /// Units: frames/second
    pub fn frame_rate(&self) -> f64 {
        self.track_coord.state().frame_rate_hz
    }

    /// Units: degrees
    pub fn referential_yaw(&self) -> f64 {
        self.referential_yaw_deg
    }

    /// Units: meters
    pub fn target(&self) -> Option<Vector3<f64>> {
        self.target_m
    }

    /// Palm to wrist distance of the latest tracked hand.
    ///
    /// Units: meters
    pub fn palm_wrist_distance(&self) -> Option<f64> {
        self.palm_wrist_dist_m
    }

    /// Snapshot of the state shared with the presentation layer
    pub fn state(&self) -> &ControlLoopState {
        self.track_coord.state()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn link(&self) -> &GimbalLink<T> {
        &self.link
    }

    /// Send a command to the gimbal, subject to the link state.
    ///
    /// Resets only need an open link, every other command also needs serial communication to
    /// be enabled.
    fn dispatch(&mut self, cmd: &GimbalCmd) {
        let allowed = match cmd {
            GimbalCmd::Reset => {
                if !self.link.is_open() {
                    warn!("Gimbal link is not open, reset not sent");
                    return
                }
                true
            },
            _ => self.track_coord.state().enable_serial && self.link.is_open(),
        };

        if !allowed {
            trace!("Dropped {:?}", cmd);
            return
        }

        if let Err(e) = self.link.send_command(cmd) {
            warn!("Could not send {:?}: {}", cmd, e);
        }
    }

    fn query_truth(&mut self) -> Option<[f32; 3]> {
        match self.truth {
            Some(ref mut client) => match client.get_position() {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ground truth unavailable: {}", e);
                    None
                }
            },
            None => None
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use gimbal_if::{
        codec::Checksum,
        hand::{HandSample, Handedness},
        telemetry::build_imu_response,
        truth::decode_floats,
    };
    use std::{
        cell::RefCell,
        io::Read,
        net::TcpListener,
        rc::Rc,
        thread,
    };
    use util::archive::ExportError;

    use crate::{
        gimbal_link::test::{open_link, MockTransport},
        gimbal_link::{self, GimbalLink},
        track_coord,
        truth_client,
    };

    /// Sink whose exports stay visible to the test after being boxed.
    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<Vec<Vec<String>>>>>);

    impl ExportSink for SharedSink {
        fn write_rows(&mut self, rows: &[Vec<String>], _delimiter: u8) -> Result<(), ExportError> {
            self.0.borrow_mut().push(rows.to_vec());
            Ok(())
        }
    }

    fn control_loop(
        link: GimbalLink<MockTransport>,
        mode: TrackingMode
    ) -> (ControlLoop<MockTransport>, SharedSink) {
        let sink = SharedSink::default();
        let tc = TrackCoord::new(track_coord::Params {
            default_mode: mode,
            invert_axis: true,
            enable_serial: true,
            ..Default::default()
        });

        let cl = ControlLoop::new(
            Params::default(),
            tc,
            link,
            imu_decoder::Params::default(),
            recorder::Params::default(),
            Box::new(sink.clone()),
        );

        (cl, sink)
    }

    fn one_hand(x: f64, y: f64, z: f64) -> HandFrame {
        HandFrame {
            hands: vec![HandSample::new(Vector3::new(x, y, z), Handedness::Right)],
            frame_rate_hz: 90.0,
        }
    }

    fn written(cl: &ControlLoop<MockTransport>) -> Vec<Vec<u8>> {
        cl.link().transport().written.clone()
    }

    fn reset_frame() -> Vec<u8> {
        GimbalCmd::Reset.encode(Checksum::default())
    }

    #[test]
    fn test_edge_trigger() {
        let mut e = EdgeTrigger::default();
        let fired: Vec<bool> = [false, true, true, true, false, true]
            .iter()
            .map(|l| e.update(*l))
            .collect();
        assert_eq!(fired, vec![false, true, false, false, false, true]);
    }

    #[test]
    fn test_single_hand_frame() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);

        cl.apply(HostCmd::Frame(one_hand(0.0, 500.0, 200.0)));

        assert_eq!(cl.pitch(), 1.0);
        assert_eq!(cl.yaw(), 0.0);
        assert_eq!(cl.roll(), 0.0);
        assert_eq!(cl.status(), "Single hand detected");
        assert_eq!(cl.frame_rate(), 90.0);
        assert_eq!(
            written(&cl),
            vec![GimbalCmd::SetAngles { pitch_deg: 1.0, roll_deg: 0.0, yaw_deg: 0.0 }
                .encode(Checksum::default())]
        );
        assert!(cl.target().is_some());
        // Wrist coincident with the palm
        assert_eq!(cl.palm_wrist_distance(), Some(0.0));
    }

    #[test]
    fn test_palm_wrist_distance() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);
        assert_eq!(cl.palm_wrist_distance(), None);

        let mut frame = one_hand(0.0, 500.0, 200.0);
        frame.hands[0].wrist_position_mm = Vector3::new(0.0, 500.0, 120.0);
        cl.on_frame(&frame);
        assert_relative_eq!(cl.palm_wrist_distance().unwrap(), 0.08);

        // Kept while no hand is tracked
        cl.on_frame(&HandFrame::default());
        assert_relative_eq!(cl.palm_wrist_distance().unwrap(), 0.08);
    }

    #[test]
    fn test_two_no_hand_frames_reset_once() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);

        cl.on_frame(&one_hand(0.0, 500.0, 200.0));
        cl.on_frame(&HandFrame::default());
        cl.on_frame(&HandFrame::default());

        let w = written(&cl);
        assert_eq!(w.len(), 2);
        assert_eq!(w[1], reset_frame());
        assert_eq!(cl.status(), "No hands detected");
        assert_eq!(cl.pitch(), 0.0);
    }

    #[test]
    fn test_dual_same_handedness() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Dual);

        let frame = HandFrame {
            hands: vec![
                HandSample::new(Vector3::new(0.0, 500.0, 200.0), Handedness::Left),
                HandSample::new(Vector3::new(50.0, 500.0, 200.0), Handedness::Left),
            ],
            frame_rate_hz: 90.0,
        };
        cl.on_frame(&frame);

        assert!(written(&cl).is_empty());
        assert_eq!(cl.pitch(), 0.0);
        assert_eq!(cl.yaw(), 0.0);
        assert_eq!(cl.status(), "No actionable sample");
    }

    #[test]
    fn test_enable_serial() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);

        cl.on_frame(&one_hand(0.0, 500.0, 200.0));
        cl.set_enable_serial(false);
        assert!(!cl.enable_serial());
        assert_eq!(written(&cl).last(), Some(&reset_frame()));

        // Orientation still tracks, but nothing is sent
        let n = written(&cl).len();
        cl.on_frame(&one_hand(0.0, 500.0, 200.0));
        assert_eq!(cl.pitch(), 1.0);
        assert_eq!(written(&cl).len(), n);

        // Telemetry is not polled either
        assert_eq!(cl.poll_chest(), None);
    }

    #[test]
    fn test_reset_key() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);

        cl.on_frame(&one_hand(0.0, 500.0, 200.0));

        // Held for three cycles, fires once
        cl.on_keys(true, false, false);
        cl.on_keys(true, false, false);
        cl.on_keys(true, false, false);

        let w = written(&cl);
        assert_eq!(w.len(), 2);
        assert_eq!(w[1], reset_frame());
        assert_eq!(cl.pitch(), 0.0);
    }

    #[test]
    fn test_reset_key_needs_serial() {
        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);
        cl.set_enable_serial(false);
        assert!(written(&cl).is_empty());

        cl.on_frame(&one_hand(0.0, 500.0, 200.0));
        cl.on_keys(true, false, false);

        // Nothing sent and the orientation is kept
        assert!(written(&cl).is_empty());
        assert_eq!(cl.pitch(), 1.0);

        // Once communication is back the next key press resets
        cl.set_enable_serial(true);
        cl.on_keys(false, false, false);
        cl.on_keys(true, false, false);
        assert_eq!(written(&cl), vec![reset_frame()]);
        assert_eq!(cl.pitch(), 0.0);
    }

    #[test]
    fn test_home_key() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let helper = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut reqs = Vec::new();
            sock.read_to_end(&mut reqs).unwrap();
            reqs
        });

        let client = TruthClient::connect(&truth_client::Params {
            enabled: true,
            endpoint,
            timeout_ms: 2000,
            ..Default::default()
        }).unwrap();

        let (mut cl, _) = control_loop(open_link(), TrackingMode::Single);

        // Without a client the key does nothing
        cl.apply(HostCmd::Keys { reset: false, record: false, home: true });
        cl.apply(HostCmd::Keys { reset: false, record: false, home: false });

        cl.set_truth_client(Some(client));

        // Held for two cycles, homes once
        cl.apply(HostCmd::Keys { reset: false, record: false, home: true });
        cl.apply(HostCmd::Keys { reset: false, record: false, home: true });

        // Closes the connection
        drop(cl);
        let reqs = helper.join().unwrap();

        // Enable on connect, then enable and set pose on home
        assert_eq!(reqs.len(), 3 + 3 + 26);
        assert_eq!(&reqs[..8], &[101, 101, 1, 101, 101, 1, 102, 102]);
        assert_eq!(
            decode_floats(&reqs[8..]),
            vec![550.0, 0.0, 380.0, -180.0, 90.0, -180.0]
        );
    }

    #[test]
    fn test_record_key() {
        let (mut cl, sink) = control_loop(open_link(), TrackingMode::Single);

        cl.on_keys(false, true, false);
        assert!(cl.is_recording());
        cl.on_frame(&one_hand(0.0, 500.0, 200.0));
        cl.on_frame(&one_hand(0.0, 500.0, 200.0));

        // Still held
        cl.on_keys(false, true, false);
        assert!(cl.is_recording());

        cl.on_keys(false, false, false);
        cl.on_keys(false, true, false);
        assert!(!cl.is_recording());

        let exports = sink.0.borrow();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].len(), 2);
        assert_eq!(exports[0][0].len(), 8);
    }

    #[test]
    fn test_poll_chest() {
        let mut link = open_link();

        let raw = |cdeg: i32| (cdeg - imu_decoder::HALF_TURN_CDEG) as i16 as u16;
        for cdeg in [18000, 18200, 18250].iter() {
            link.transport_mut().reads.push_back(build_imu_response(raw(*cdeg)));
        }

        let (mut cl, _) = control_loop(link, TrackingMode::Single);

        // First reading only sets the reference
        assert_eq!(cl.poll_chest(), Some(0.0));
        assert_relative_eq!(cl.poll_chest().unwrap(), -5.0);
        assert_eq!(cl.poll_chest(), Some(0.0));
        assert_relative_eq!(cl.referential_yaw(), -5.0);

        // Nothing left to read
        assert_eq!(cl.poll_chest(), None);
    }

    #[test]
    fn test_degraded_mode() {
        let mut transport = MockTransport::default();
        transport.fail_open = true;
        let mut link = GimbalLink::new(transport, &gimbal_link::Params::default());
        assert!(link.open().is_err());

        let (mut cl, _) = control_loop(link, TrackingMode::Single);

        cl.on_frame(&one_hand(0.0, 500.0, 200.0));
        cl.on_keys(true, false, false);
        cl.on_frame(&HandFrame::default());
        assert_eq!(cl.poll_chest(), None);

        // The loop keeps tracking without a link, the reset key is ignored
        assert!(written(&cl).is_empty());
        assert_eq!(cl.status(), "No hands detected");
        assert_eq!(cl.pitch(), 0.0);
    }
}
