//! # Ground Truth Pose Link
//!
//! Wire format of the link to the external pose tracking helper (a robot arm holding the tracked
//! hand replica). Requests start with a fixed two byte tag, floats are little-endian `f32`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tag of the enable/disable request.
pub const ENABLE_TAG: [u8; 2] = [101, 101];

/// Tag of the set pose request.
pub const SET_POSE_TAG: [u8; 2] = [102, 102];

/// Suffix appended to [`SET_POSE_TAG`] to request the current pose instead.
pub const GET_POSE_SUFFIX: u8 = 107;

/// Number of floats in a pose.
pub const POSE_LEN: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A 6-DoF pose as exchanged with the pose link, `[x, y, z, roll, pitch, yaw]`.
///
/// Units: millimeters, degrees
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TruthPose(pub [f32; POSE_LEN]);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TruthRequest {
    /// Switch the remote device on or off
    Enable(bool),

    /// Move to the given absolute pose
    SetPose(TruthPose),

    /// Request the current pose
    GetPose,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TruthRequest {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TruthRequest::Enable(on) => vec![ENABLE_TAG[0], ENABLE_TAG[1], *on as u8],
            TruthRequest::SetPose(pose) => {
                let mut buf = vec![0u8; 2 + 4 * POSE_LEN];
                buf[..2].copy_from_slice(&SET_POSE_TAG);
                LittleEndian::write_f32_into(&pose.0, &mut buf[2..]);
                buf
            }
            TruthRequest::GetPose => vec![SET_POSE_TAG[0], SET_POSE_TAG[1], GET_POSE_SUFFIX],
        }
    }
}

impl TruthPose {
    /// Add an offset pose component-wise.
    pub fn offset_by(&self, offset: &TruthPose) -> TruthPose {
        let mut out = self.0;
        for (o, d) in out.iter_mut().zip(offset.0.iter()) {
            *o += d;
        }
        TruthPose(out)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a get pose response into its floats. Trailing bytes which do not form a whole float are
/// ignored.
pub fn decode_floats(response: &[u8]) -> Vec<f32> {
    let n = response.len() / 4;
    let mut floats = vec![0f32; n];
    LittleEndian::read_f32_into(&response[..n * 4], &mut floats);
    floats
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
