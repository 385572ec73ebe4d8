//! # Host command scripts
//!
//! Replays recorded hand frames and operator inputs against the session clock. A script is a
//! list of `<time_s>: <json>;` entries, in any order:
//!
//! ```text
//! 0.0: {"SetTrackingMode": "Single"};
//! 0.1: {"Frame": {"hands": [{"palm_position_mm": [0, 500, 200], "handedness": "Right"}]}};
//! ```
//!
//! Anything between entries that does not match that pattern is ignored, which leaves room for
//! free text notes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::{Regex, RegexBuilder};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use gimbal_if::host_cmd::{HostCmd, HostCmdParseError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// One entry: a non-negative decimal time, a colon, then everything up to the next `;`.
const ENTRY_PATTERN: &str = r"^\s*(\d+(?:\.\d+)?)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

struct ScriptedCmd {
    due_s: f64,
    cmd: HostCmd,
}

/// Queue of scripted commands, sorted by due time.
pub struct ScriptInterpreter {
    queue: VecDeque<ScriptedCmd>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("No script at {0}")]
    ScriptNotFound(String),

    #[error("Failed to read the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script contains no `<time>: <command>;` entries")]
    ScriptEmpty,

    #[error("Unreadable entry time ({0}), expected seconds as a decimal number")]
    InvalidTimestamp(String),

    #[error("Unreadable command due at {0} s: {1}")]
    InvalidCmd(f64, HostCmdParseError),
}

/// Result of polling the script at a given time.
pub enum PendingCmds {
    None,
    Some(Vec<HostCmd>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.is_file() {
            return Err(ScriptError::ScriptNotFound(path.display().to_string()));
        }

        let text = fs::read_to_string(path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_text(&text)
    }

    /// Build an interpreter from the text of a script.
    pub fn from_text(text: &str) -> Result<Self, ScriptError> {
        let mut queue = entry_regex()
            .captures_iter(text)
            .map(|cap| -> Result<ScriptedCmd, ScriptError> {
                let due_s: f64 = cap[1]
                    .parse()
                    .map_err(|_| ScriptError::InvalidTimestamp(cap[1].to_string()))?;
                let cmd = HostCmd::from_json(cap[2].trim())
                    .map_err(|e| ScriptError::InvalidCmd(due_s, e))?;
                Ok(ScriptedCmd { due_s, cmd })
            })
            .collect::<Result<VecDeque<_>, ScriptError>>()?;

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        queue
            .make_contiguous()
            .sort_by(|a, b| a.due_s.total_cmp(&b.due_s));

        Ok(Self { queue })
    }

    /// Pop every command due strictly before `now_s`.
    pub fn get_pending_cmds(&mut self, now_s: f64) -> PendingCmds {
        if self.queue.is_empty() {
            return PendingCmds::EndOfScript;
        }

        let num_due = self.queue
            .iter()
            .take_while(|c| c.due_s < now_s)
            .count();

        match num_due {
            0 => PendingCmds::None,
            n => PendingCmds::Some(self.queue.drain(..n).map(|c| c.cmd).collect()),
        }
    }

    pub fn get_num_cmds(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the last command.
    pub fn get_duration(&self) -> f64 {
        self.queue.back().map_or(0.0, |c| c.due_s)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn entry_regex() -> Regex {
    RegexBuilder::new(ENTRY_PATTERN)
        .multi_line(true)
        .build()
        .unwrap_or_else(|e| unreachable!("ENTRY_PATTERN does not compile: {}", e))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use gimbal_if::host_cmd::TrackingMode;

    const SCRIPT: &str = r#"
        Operator resets, after switching to dual mode
        0.5: {"Keys": {"reset": true, "record": false}};
        0.0: {"SetTrackingMode": "Dual"};
        1.0: {"Frame": {"hands": []}};
    "#;

    #[test]
    fn test_pending_cmds() {
        let mut si = ScriptInterpreter::from_text(SCRIPT).unwrap();

        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 1.0);

        match si.get_pending_cmds(0.1) {
            PendingCmds::Some(c) => assert_eq!(
                c,
                vec![HostCmd::SetTrackingMode(TrackingMode::Dual)]
            ),
            _ => panic!("Expected the mode command to be pending"),
        }
        assert!(matches!(si.get_pending_cmds(0.2), PendingCmds::None));
        match si.get_pending_cmds(2.0) {
            PendingCmds::Some(c) => assert_eq!(c.len(), 2),
            _ => panic!("Expected two pending commands"),
        }
        assert!(matches!(si.get_pending_cmds(3.0), PendingCmds::EndOfScript));
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_text("nothing to see here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_text("0.1: {\"Jump\": 1};"),
            Err(ScriptError::InvalidCmd(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/does/not/exist.prs"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
