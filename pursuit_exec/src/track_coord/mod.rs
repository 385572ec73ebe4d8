//! Tracking mode coordination module
//!
//! Selects the estimation path for each hand tracking frame, drives the angle estimator, the
//! orientation accumulator and the spherical projector, and produces the gimbal command for the
//! frame.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use crate::angle_est::AngleEstError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TrackCoord operation.
#[derive(Debug, thiserror::Error)]
pub enum TrackCoordError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Frame skipped: {0}")]
    FrameSkipped(AngleEstError),
}
