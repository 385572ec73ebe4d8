//! # Telemetry Frame Parsing
//!
//! Responses to an IMU query look like `FB 08 06 00 01 <8 byte payload> ...`. The controller yaw
//! angle is the little-endian `u16` at bytes 4 and 5 of the payload, in hundredths of a degree.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Marker preceding the payload of an IMU query response.
pub const IMU_MARKER: [u8; 5] = [0xFB, 0x08, 0x06, 0x00, 0x01];

/// Length of the payload following [`IMU_MARKER`].
pub const IMU_PAYLOAD_LEN: usize = 8;

/// Offset of the yaw field within the payload.
pub const YAW_OFFSET: usize = 4;

/// Size of the buffer used to read a telemetry response.
pub const TELEMETRY_FRAME_LEN: usize = 70;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("IMU response marker not found in {0} byte response")]
    MarkerNotFound(usize),

    #[error("IMU payload truncated, expected 8 bytes but found {0}")]
    Truncated(usize),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Locate the IMU payload within a raw telemetry response.
pub fn imu_payload(response: &[u8]) -> Result<&[u8], TelemetryError> {
    let start = response
        .windows(IMU_MARKER.len())
        .position(|w| w == &IMU_MARKER[..])
        .map(|p| p + IMU_MARKER.len())
        .ok_or(TelemetryError::MarkerNotFound(response.len()))?;

    let rest = &response[start..];
    if rest.len() < IMU_PAYLOAD_LEN {
        return Err(TelemetryError::Truncated(rest.len()));
    }

    Ok(&rest[..IMU_PAYLOAD_LEN])
}

/// Extract the raw, unsigned yaw field from a telemetry response.
///
/// Units: hundredths of a degree
pub fn raw_yaw(response: &[u8]) -> Result<u16, TelemetryError> {
    let payload = imu_payload(response)?;
    Ok(LittleEndian::read_u16(&payload[YAW_OFFSET..YAW_OFFSET + 2]))
}

/// Build a response frame carrying the given raw yaw, padded to [`TELEMETRY_FRAME_LEN`].
///
/// Useful for simulating the controller.
pub fn build_imu_response(raw_yaw: u16) -> Vec<u8> {
    let mut buf = vec![0u8; TELEMETRY_FRAME_LEN];
    buf[..IMU_MARKER.len()].copy_from_slice(&IMU_MARKER);
    let yaw_start = IMU_MARKER.len() + YAW_OFFSET;
    LittleEndian::write_u16(&mut buf[yaw_start..yaw_start + 2], raw_yaw);
    buf
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_raw_yaw() {
        // Leading junk before the marker is skipped
        let mut resp = vec![0x00, 0x12];
        resp.extend_from_slice(&IMU_MARKER);
        resp.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x34, 0x12, 0x00, 0x00]);

        assert_eq!(raw_yaw(&resp), Ok(0x1234));
        assert_eq!(raw_yaw(&build_imu_response(17999)), Ok(17999));
    }

    #[test]
    fn test_bad_frames() {
        assert_eq!(raw_yaw(&[0u8; 70]), Err(TelemetryError::MarkerNotFound(70)));

        let mut resp = IMU_MARKER.to_vec();
        resp.extend_from_slice(&[0x01, 0x02]);
        assert_eq!(raw_yaw(&resp), Err(TelemetryError::Truncated(2)));
    }
}
