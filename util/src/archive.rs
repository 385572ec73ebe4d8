//! Evaluation trace export
//!
//! Recorded rows are handed to an [`ExportSink`] in one go when a recording stops. The
//! [`CsvSink`] writes them as a delimited text file in the session archive directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::{Path, PathBuf};
use csv::WriterBuilder;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Writes exported rows to a CSV file, one new file per export.
pub struct CsvSink {
    dir: PathBuf,
    file_stem: String,
    num_exports: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot create the export file: {0}")]
    CreateError(csv::Error),

    #[error("Cannot write to the export file: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the export file: {0}")]
    FlushError(std::io::Error),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Destination for exported evaluation traces.
pub trait ExportSink {
    /// Write all rows using the given field delimiter.
    fn write_rows(&mut self, rows: &[Vec<String>], delimiter: u8) -> Result<(), ExportError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CsvSink {
    /// Create a sink writing `{file_stem}_{n}.csv` files into the given directory.
    pub fn new<P: AsRef<Path>>(dir: P, file_stem: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            file_stem: file_stem.to_string(),
            num_exports: 0,
        }
    }

    /// Create a sink writing into the session's archive directory.
    pub fn from_session(session: &Session, file_stem: &str) -> Self {
        Self::new(&session.arch_root, file_stem)
    }

    /// Path of the file the next export will be written to.
    pub fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", self.file_stem, self.num_exports))
    }
}

impl ExportSink for CsvSink {
    fn write_rows(&mut self, rows: &[Vec<String>], delimiter: u8) -> Result<(), ExportError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_path(self.next_path())
            .map_err(ExportError::CreateError)?;

        for row in rows {
            writer.write_record(row).map_err(ExportError::WriteError)?;
        }
        writer.flush().map_err(ExportError::FlushError)?;

        self.num_exports += 1;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_csv_sink() {
        let dir = std::env::temp_dir().join(format!("pursuit_archive_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut sink = CsvSink::new(&dir, "rec");
        let first = sink.next_path();

        let rows = vec![
            vec!["0.1".to_string(), "12.5".to_string()],
            vec!["0.2".to_string(), "-3".to_string()],
        ];
        sink.write_rows(&rows, b';').unwrap();

        assert_eq!(std::fs::read_to_string(&first).unwrap(), "0.1;12.5\n0.2;-3\n");
        assert_ne!(sink.next_path(), first);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
