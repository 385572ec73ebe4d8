//! # Pursuit library.
//!
//! This library allows other crates in the workspace, and the pursuit executable itself, to access
//! the items making up the gimbal control loop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Angle estimation - converts palm positions into per-cycle gimbal steps
pub mod angle_est;

/// Control loop - owns the stateful modules and exposes the command surface
pub mod control_loop;

/// Gimbal link - serial connection to the gimbal controller board
pub mod gimbal_link;

/// IMU angle decoder - extracts the chest angle from the gimbal telemetry
pub mod imu_decoder;

/// Orientation accumulator - integrates steps into the clamped gimbal orientation
pub mod orient_acc;

/// Executable parameters
pub mod params;

/// Recorder - buffers evaluation samples and exports them
pub mod recorder;

/// Spherical projection - maps the gimbal orientation back to a hand offset
pub mod sph_proj;

/// Tracking mode coordination - picks the estimation path for each frame
pub mod track_coord;

/// Ground truth client - talks to the pose helper during evaluation
pub mod truth_client;
