//! # IMU angle decoder module
//!
//! Decodes the controller board's yaw angle from telemetry, which gives the orientation of the
//! operator's torso (the gimbal base is worn on the chest). Only moderate changes between two
//! polls are reported, small changes are treated as jitter and large jumps as spikes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};

use gimbal_if::telemetry;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Half-turn in telemetry units, used both as the wraparound threshold and as the re-centering
/// bias.
///
/// Units: hundredths of a degree
pub const HALF_TURN_CDEG: i32 = 18000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Acceptance band of the decoder. Both thresholds are calibration values which depend on the
/// gimbal calibration, they are not derived from anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Changes up to and including this magnitude are considered noise.
    ///
    /// Units: hundredths of a degree
    pub noise_threshold_cdeg: i32,

    /// Changes strictly above this magnitude are considered outliers.
    ///
    /// Units: hundredths of a degree
    pub outlier_threshold_cdeg: i32,
}

/// Result of decoding one telemetry response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuReading {
    /// Chest angle after this poll. Unchanged if the response could not be parsed.
    ///
    /// Units: hundredths of a degree, biased by [`HALF_TURN_CDEG`]
    pub chest_angle_cdeg: i32,

    /// Accepted change since the previous poll, zero if rejected.
    ///
    /// Units: hundredths of a degree
    pub delta_cdeg: i32,

    pub status: ImuStatus,
}

/// Tracks the chest angle across polls.
#[derive(Debug, Clone, Default)]
pub struct ChestTracker {
    params: Params,
    chest_angle_cdeg: i32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImuStatus {
    /// Delta within the acceptance band
    Accepted,

    /// Delta below the noise threshold
    NoisyReading,

    /// Delta above the outlier threshold
    OutlierReading,

    /// Response could not be parsed
    TelemetryUnparsable,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            noise_threshold_cdeg: 120,
            outlier_threshold_cdeg: 300,
        }
    }
}

impl ChestTracker {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            chest_angle_cdeg: 0,
        }
    }

    /// Last known chest angle
    pub fn chest_angle_cdeg(&self) -> i32 {
        self.chest_angle_cdeg
    }

    /// Decode a telemetry response and update the chest angle.
    pub fn update(&mut self, response: &[u8]) -> ImuReading {
        let reading = decode(response, self.chest_angle_cdeg, &self.params);
        self.chest_angle_cdeg = reading.chest_angle_cdeg;

        trace!("IMU reading: {:?}", reading);

        reading
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise a raw yaw field into a signed angle biased by half a turn.
///
/// Raw values above half a turn are negative angles, wrapped over the bit width of the value:
/// 15 bits below `0x8000`, 16 bits from there on.
pub fn normalise_yaw(raw: u16) -> i32 {
    let raw = raw as i32;
    let signed = if raw <= HALF_TURN_CDEG {
        raw
    }
    else if raw < 0x8000 {
        raw - 0x8000
    }
    else {
        raw - 0x1_0000
    };

    signed + HALF_TURN_CDEG
}

/// Decode a telemetry response against the previous chest angle.
pub fn decode(response: &[u8], previous_cdeg: i32, params: &Params) -> ImuReading {
    let raw = match telemetry::raw_yaw(response) {
        Ok(r) => r,
        Err(e) => {
            trace!("Unparsable IMU telemetry: {}", e);
            return ImuReading {
                chest_angle_cdeg: previous_cdeg,
                delta_cdeg: 0,
                status: ImuStatus::TelemetryUnparsable,
            }
        }
    };

    let chest_angle_cdeg = normalise_yaw(raw);
    let diff = chest_angle_cdeg - previous_cdeg;

    let (delta_cdeg, status) = if diff.abs() <= params.noise_threshold_cdeg {
        (0, ImuStatus::NoisyReading)
    }
    else if diff.abs() > params.outlier_threshold_cdeg {
        (0, ImuStatus::OutlierReading)
    }
    else {
        (diff, ImuStatus::Accepted)
    };

    ImuReading {
        chest_angle_cdeg,
        delta_cdeg,
        status,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
