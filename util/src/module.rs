//! Cyclic module interface
//!
//! Processing modules driven by the control loop (currently `TrackCoord`) are initialised once
//! from their parameters and then stepped with one input per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A stateful module stepped once per control cycle.
pub trait State {
    /// Parameters consumed by `init`.
    type InitData;
    type InitError;

    /// Per-cycle input.
    type InputData;
    /// Per-cycle result, consumed by the caller.
    type OutputData;
    /// Diagnostic summary of a cycle, suitable for logging.
    type StatusReport;
    type ProcError;

    /// Prepare the module for cycling. Must be called before the first `proc`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one input, returning the output alongside a status report.
    ///
    /// An error leaves the module ready for the next cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
