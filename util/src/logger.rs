//! Logger set-up
//!
//! Records go to stdout with coloured level tags and to the session log file without colour
//! codes. Every line is stamped with the seconds elapsed since the session epoch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which are capped at `Info` whatever the requested level.
const QUIET_TARGETS: [&str; 1] = ["serialport"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log level must include at least INFO messages, found `{0}`")]
    LevelTooQuiet(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileError(std::io::Error),

    #[error("A logger has already been installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this execution.
///
/// `min_level` must be `Info` or more verbose. Only the first call can succeed.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                coloured_tag(record.level()),
                target_prefix(record),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                plain_tag(record.level()),
                target_prefix(record),
                message
            ))
        })
        .chain(log_file);

    let mut root = fern::Dispatch::new().level(min_level);
    for target in QUIET_TARGETS.iter() {
        root = root.level_for(*target, LevelFilter::Info);
    }

    root.chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!("Logging initialised at {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Debug and trace records are prefixed with their target.
fn target_prefix(record: &Record) -> String {
    if record.level() > Level::Info {
        format!("{}: ", record.target())
    }
    else {
        String::new()
    }
}

fn plain_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn coloured_tag(level: Level) -> ColoredString {
    let tag = plain_tag(level);
    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
