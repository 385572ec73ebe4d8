//! # Gimbal Command Codec
//!
//! Encodes commands sent to the gimbal controller board. All frames are fixed-width byte buffers
//! of the form `FA <len> <cmd id> <payload> <checksum>`, with floating point values sent as
//! little-endian IEEE-754.
//!
//! Human readable hex is only used for logging, see [`bytes_to_hex`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Start byte of all frames sent to the controller.
pub const START_BYTE: u8 = 0xFA;

/// Header of the reset (restore default position) command.
pub const RESET_HEADER: [u8; 3] = [START_BYTE, 0x06, 0x12];

/// Header of the set angles command.
pub const SET_ANGLES_HEADER: [u8; 3] = [START_BYTE, 0x0E, 0x11];

/// Header of the IMU data query command.
pub const GET_IMU_HEADER: [u8; 3] = [START_BYTE, 0x02, 0x06];

/// Payload of the IMU data query, selects the yaw field.
pub const GET_IMU_PAYLOAD: [u8; 2] = [0x00, 0x01];

/// Flags sent with a set angles command.
pub const SET_ANGLES_FLAGS: [u8; 2] = [0x00, 0x00];

/// Default checksum placeholder.
///
/// The controller protocol carries a CRC in this position, but no real CRC is computed.
pub const DEFAULT_CHECKSUM: Checksum = Checksum([0x33, 0x34]);

/// Length of an encoded reset frame
pub const RESET_LEN: usize = 3 + 6 + 2;

/// Length of an encoded set angles frame
pub const SET_ANGLES_LEN: usize = 3 + 3 * 4 + 2 + 2;

/// Length of an encoded IMU query frame
pub const GET_IMU_LEN: usize = 3 + 2 + 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Two byte checksum field appended to every frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum(pub [u8; 2]);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be sent to the gimbal controller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum GimbalCmd {
    /// Return all axes to the default position
    Reset,

    /// Move to the given absolute angles.
    ///
    /// Units: degrees
    SetAngles {
        pitch_deg: f32,
        roll_deg: f32,
        yaw_deg: f32,
    },

    /// Request the controller IMU yaw angle
    GetImu,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed hex string: {0}")]
    MalformedHex(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Checksum {
    fn default() -> Self {
        DEFAULT_CHECKSUM
    }
}

impl GimbalCmd {
    /// Encode the command into the frame sent over the wire.
    pub fn encode(&self, checksum: Checksum) -> Vec<u8> {
        match self {
            GimbalCmd::Reset => {
                let mut buf = [0u8; RESET_LEN];
                buf[0..3].copy_from_slice(&RESET_HEADER);
                buf[9..11].copy_from_slice(&checksum.0);
                buf.to_vec()
            }
            GimbalCmd::SetAngles {
                pitch_deg,
                roll_deg,
                yaw_deg,
            } => {
                let mut buf = [0u8; SET_ANGLES_LEN];
                buf[0..3].copy_from_slice(&SET_ANGLES_HEADER);
                buf[3..7].copy_from_slice(&float_to_wire_bytes(*pitch_deg));
                buf[7..11].copy_from_slice(&float_to_wire_bytes(*roll_deg));
                buf[11..15].copy_from_slice(&float_to_wire_bytes(*yaw_deg));
                buf[15..17].copy_from_slice(&SET_ANGLES_FLAGS);
                buf[17..19].copy_from_slice(&checksum.0);
                buf.to_vec()
            }
            GimbalCmd::GetImu => {
                let mut buf = [0u8; GET_IMU_LEN];
                buf[0..3].copy_from_slice(&GET_IMU_HEADER);
                buf[3..5].copy_from_slice(&GET_IMU_PAYLOAD);
                buf[5..7].copy_from_slice(&checksum.0);
                buf.to_vec()
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a float into its wire representation, most significant byte last.
pub fn float_to_wire_bytes(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Inverse of [`float_to_wire_bytes`].
pub fn wire_bytes_to_float(bytes: [u8; 4]) -> f32 {
    f32::from_le_bytes(bytes)
}

/// Format bytes as a lowercase hex string with no separators.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing into a String cannot fail
        let _ = write!(hex, "{:02x}", b);
    }
    hex
}

/// Parse a hex string (either case, no separators) into bytes.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CodecError> {
    if hex.len() % 2 != 0 {
        return Err(CodecError::MalformedHex(format!(
            "odd length ({} characters)",
            hex.len()
        )));
    }

    hex.as_bytes()
        .chunks(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CodecError::MalformedHex(format!(
                "invalid digits {:?}",
                String::from_utf8_lossy(pair)
            ))),
        })
        .collect()
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
