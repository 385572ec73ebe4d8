//! TOML parameter loading
//!
//! Parameter files live in `$PURSUIT_SW_ROOT/params`. Any `DeserializeOwned` type can be
//! loaded, missing fields fall back to whatever the type's serde defaults say.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("PURSUIT_SW_ROOT is not set, cannot locate the params directory")]
    SwRootNotSet,

    #[error("Failed to read the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Malformed parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load `file_name` from the params directory of the software root.
pub fn load<P: DeserializeOwned>(file_name: &str) -> Result<P, LoadError> {
    let params_dir = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?
        .join("params");

    load_from_path(params_dir.join(file_name))
}

pub fn load_from_path<P, Q>(path: Q) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    Q: AsRef<Path>,
{
    let text = fs::read_to_string(path).map_err(LoadError::FileLoadError)?;
    from_str(&text)
}

pub fn from_str<P: DeserializeOwned>(text: &str) -> Result<P, LoadError> {
    toml::from_str(text).map_err(LoadError::DeserialiseError)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
