//! Execution sessions
//!
//! A session owns a timestamped directory under the software root:
//!
//! ```text
//! $PURSUIT_SW_ROOT/<sessions_dir>/<exec_name>_<timestamp>/
//!     <exec_name>.log
//!     arch/
//! ```
//!
//! Creating the session also fixes the epoch used by log stamps and the script clock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::{host, time};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// strftime pattern used in session directory names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the archive subdirectory.
const ARCH_DIR_NAME: &str = "arch";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Session {
    pub session_root: PathBuf,

    /// Recordings and other exported files go here.
    pub arch_root: PathBuf,

    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("PURSUIT_SW_ROOT is not set")]
    SwRootNotSet,

    #[error("Failed to create a session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("The session epoch is already set, only one session may exist per process ({0})")]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("The session epoch is not available")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Fix the session epoch and create `<sessions_dir>/<exec_name>_<timestamp>` under the
    /// software root.
    ///
    /// Only one session can be created per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;
        let epoch = SESSION_EPOCH.get().ok_or(SessionError::CannotGetEpoch)?;

        let sw_root = host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::create_in(
            &sw_root.join(sessions_dir),
            &format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT)),
            exec_name,
        )
    }

    /// Lay out the session directory tree in `parent`.
    fn create_in(parent: &Path, dir_name: &str, exec_name: &str) -> Result<Self, SessionError> {
        let session_root = parent.join(dir_name);
        let arch_root = session_root.join(ARCH_DIR_NAME);

        // Creating the archive directory also creates the session root
        fs::create_dir_all(&arch_root).map_err(SessionError::CannotCreateDir)?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            arch_root,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds since the session epoch, `NaN` if no session exists yet.
pub fn get_elapsed_seconds() -> f64 {
    SESSION_EPOCH
        .get()
        .map(time::seconds_since)
        .unwrap_or(std::f64::NAN)
}

pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_in() {
        let parent = std::env::temp_dir().join(format!("pursuit_session_{}", std::process::id()));

        let session = Session::create_in(&parent, "exec_20260101_000000", "exec").unwrap();

        assert!(session.arch_root.is_dir());
        assert_eq!(session.arch_root.parent(), Some(session.session_root.as_path()));
        assert_eq!(session.log_file_path, session.session_root.join("exec.log"));

        fs::remove_dir_all(&parent).unwrap();
    }
}
