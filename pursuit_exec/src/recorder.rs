//! # Evaluation recorder
//!
//! Buffers the computed hand targets while a recording is running, and hands them to an export
//! sink when the recording stops.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use util::archive::{ExportError, ExportSink};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Field delimiter of the exported file
    pub delimiter: char,

    /// Stem of the exported file names
    pub file_stem: String,
}

/// One recorded cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedSample {
    /// Time since the recording started.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Computed hand target.
    ///
    /// Units: meters
    pub target_m: Vector3<f64>,

    /// Units: millimeters/second
    pub speed_mms: f64,

    /// Ground truth position if the pose helper is connected.
    ///
    /// Units: millimeters
    pub truth_mm: Option<[f32; 3]>,
}

#[derive(Debug, Default)]
pub struct Recorder {
    params: Params,
    start_s: Option<f64>,
    samples: Vec<RecordedSample>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            delimiter: ',',
            file_stem: String::from("recording"),
        }
    }
}

impl RecordedSample {
    /// Export row: time, speed, target (mm), truth (mm, zero if absent).
    pub fn to_row(&self) -> Vec<String> {
        let truth = self.truth_mm.unwrap_or([0.0; 3]);

        vec![
            self.time_s.to_string(),
            self.speed_mms.to_string(),
            (self.target_m.x * 1000.0).to_string(),
            (self.target_m.y * 1000.0).to_string(),
            (self.target_m.z * 1000.0).to_string(),
            truth[0].to_string(),
            truth[1].to_string(),
            truth[2].to_string(),
        ]
    }
}

impl Recorder {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            start_s: None,
            samples: Vec::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.start_s.is_some()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Start recording, `now_s` becomes the time origin of the samples.
    pub fn start(&mut self, now_s: f64) {
        info!("Recording started");
        self.start_s = Some(now_s);
    }

    /// Append a sample, ignored if not recording.
    pub fn record(
        &mut self,
        now_s: f64,
        target_m: &Vector3<f64>,
        speed_mms: f64,
        truth_mm: Option<[f32; 3]>
    ) {
        if let Some(start_s) = self.start_s {
            self.samples.push(RecordedSample {
                time_s: now_s - start_s,
                target_m: *target_m,
                speed_mms,
                truth_mm,
            });
        }
    }

    /// Stop recording and export the buffered samples.
    ///
    /// The buffer is cleared whether or not the export succeeded. Returns the number of exported
    /// rows.
    pub fn stop_and_export(&mut self, sink: &mut dyn ExportSink) -> Result<usize, ExportError> {
        self.start_s = None;

        let rows: Vec<Vec<String>> = self.samples
            .drain(..)
            .map(|s| s.to_row())
            .collect();

        let mut delim = [0u8; 4];
        let delimiter = self.params.delimiter.encode_utf8(&mut delim).as_bytes()[0];

        sink.write_rows(&rows, delimiter)?;

        info!("Recording stopped, {} samples exported", rows.len());

        Ok(rows.len())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Sink keeping every export in memory.
    #[derive(Default)]
    struct MemSink {
        exports: Vec<(Vec<Vec<String>>, u8)>,
    }

    impl ExportSink for MemSink {
        fn write_rows(&mut self, rows: &[Vec<String>], delimiter: u8) -> Result<(), ExportError> {
            self.exports.push((rows.to_vec(), delimiter));
            Ok(())
        }
    }

    #[test]
    fn test_record_and_export() {
        let mut rec = Recorder::new(Params::default());
        let mut sink = MemSink::default();

        // Not recording yet
        rec.record(1.0, &Vector3::new(0.1, 0.2, 0.3), 10.0, None);
        assert_eq!(rec.num_samples(), 0);

        rec.start(2.0);
        assert!(rec.is_recording());
        rec.record(2.5, &Vector3::new(0.1, -0.2, 0.5), 12.5, None);
        rec.record(3.0, &Vector3::new(0.0, 0.0, 0.25), 0.0, Some([1.0, 2.0, 3.5]));

        assert_eq!(rec.stop_and_export(&mut sink).unwrap(), 2);
        assert!(!rec.is_recording());
        assert_eq!(rec.num_samples(), 0);

        let (rows, delim) = &sink.exports[0];
        assert_eq!(*delim, b',');
        assert_eq!(rows[0], vec!["0.5", "12.5", "100", "-200", "500", "0", "0", "0"]);
        assert_eq!(rows[1], vec!["1", "0", "0", "0", "250", "1", "2", "3.5"]);

        // An empty recording still exports
        rec.start(4.0);
        assert_eq!(rec.stop_and_export(&mut sink).unwrap(), 0);
        assert_eq!(sink.exports.len(), 2);
    }
}
