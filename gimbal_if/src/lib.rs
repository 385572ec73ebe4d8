//! # Gimbal interface crate.
//!
//! Provides all common interfaces between the control loop and its collaborators: the hand
//! tracker, the gimbal controller board and the ground truth pose link.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Hand tracking frames as supplied by the hand tracker
pub mod hand;

/// Command frame encoding for the gimbal controller board
pub mod codec;

/// Telemetry frame parsing
pub mod telemetry;

/// Wire format of the ground truth pose link
pub mod truth;

/// Commands issued by the host application (frames, key states, toggles)
pub mod host_cmd;
