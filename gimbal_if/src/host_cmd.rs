//! # Host Command Module
//!
//! Commands issued by the host application to the control loop. In the live system these come
//! from the tracker callback and the UI; the executable replays them from a script.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hand::HandFrame;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which estimation path the control loop follows.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Follow the first tracked hand
    Single,

    /// Follow the midpoint between a left and a right hand
    Dual,
}

/// A command from the host application.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum HostCmd {
    /// A new hand tracking frame
    Frame(HandFrame),

    /// Current state of the host keys. Actions fire on the key-down transition only.
    Keys {
        reset: bool,
        record: bool,

        /// Return the pose helper's arm to its initial pose
        #[serde(default)]
        home: bool,
    },

    /// Select the tracking mode
    SetTrackingMode(TrackingMode),

    /// Enable or disable communication with the gimbal
    SetEnableSerial(bool),

    /// Invert the tracker's height axis
    SetInvertAxis(bool),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum HostCmdParseError {
    #[error("Host command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrackingMode {
    fn default() -> Self {
        TrackingMode::Single
    }
}

impl HostCmd {
    /// Parse a host command from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, HostCmdParseError> {
        serde_json::from_str(json_str).map_err(HostCmdParseError::InvalidJson)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(
            HostCmd::from_json(r#"{"SetTrackingMode": "Dual"}"#).unwrap(),
            HostCmd::SetTrackingMode(TrackingMode::Dual)
        );
        assert_eq!(
            HostCmd::from_json(r#"{"Keys": {"reset": true, "record": false}}"#).unwrap(),
            HostCmd::Keys { reset: true, record: false, home: false }
        );
        assert_eq!(
            HostCmd::from_json(r#"{"Keys": {"reset": false, "record": false, "home": true}}"#)
                .unwrap(),
            HostCmd::Keys { reset: false, record: false, home: true }
        );
        match HostCmd::from_json(r#"{"Frame": {"hands": [], "frame_rate_hz": 90.0}}"#).unwrap() {
            HostCmd::Frame(f) => assert_eq!(f.num_hands(), 0),
            c => panic!("Expected a frame, got {:?}", c),
        }
        assert!(HostCmd::from_json(r#"{"Launch": true}"#).is_err());
    }
}
