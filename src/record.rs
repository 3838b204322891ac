//! Persisting spectra to disk

use std::{
    fmt::Write as _,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::PersistenceError;

/// Two fixed numbers every legacy record header carries
pub const LEGACY_HEADER_PAIR: (u32, u32) = (15, 75);

/// Where the records of a batch go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    path: PathBuf,
}

impl Destination {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Metadata written ahead of the samples
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    pub integration_ms: u64,
    pub sensitivity: &'static str,
    pub time_constant_s: f64,
    pub legacy: (u32, u32),
    /// Number of sweeps averaged into the samples; zero for a raw partial sweep
    pub averages: u32,
    pub start_mhz: f64,
    pub stop_mhz: f64,
    pub step_mhz: f64,
}

impl RecordHeader {
    pub fn is_averaged(&self) -> bool {
        self.averages > 0
    }
}

pub trait Persistence {
    fn write_record(
        &mut self,
        destination: &Destination,
        samples: &[f64],
        header: &RecordHeader,
    ) -> Result<(), PersistenceError>;
}

/// Appends text records, a `#` header block followed by one sample per line
#[derive(Debug, Default)]
pub struct RecordWriter;

impl RecordWriter {
    fn format(samples: &[f64], header: &RecordHeader) -> String {
        let mut out = String::with_capacity(256 + samples.len() * 24);
        // Writing into a String can't fail
        let _ = writeln!(out, "# integration_ms: {}", header.integration_ms);
        let _ = writeln!(out, "# sensitivity: {}", header.sensitivity);
        let _ = writeln!(out, "# time_constant_s: {}", header.time_constant_s);
        let _ = writeln!(out, "# legacy: {} {}", header.legacy.0, header.legacy.1);
        if header.is_averaged() {
            let _ = writeln!(out, "# averages: {}", header.averages);
        } else {
            let _ = writeln!(out, "# averages: 0 (unaveraged partial sweep)");
        }
        let _ = writeln!(out, "# start_mhz: {}", header.start_mhz);
        let _ = writeln!(out, "# stop_mhz: {}", header.stop_mhz);
        let _ = writeln!(out, "# step_mhz: {}", header.step_mhz);
        let _ = writeln!(out, "# points: {}", samples.len());
        for y in samples {
            let _ = writeln!(out, "{y}");
        }
        out
    }
}

impl Persistence for RecordWriter {
    fn write_record(
        &mut self,
        destination: &Destination,
        samples: &[f64],
        header: &RecordHeader,
    ) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: destination.path().to_path_buf(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(destination.path())
            .map_err(io_err)?;
        file.write_all(Self::format(samples, header).as_bytes())
            .map_err(io_err)?;
        debug!(
            "Wrote {} samples to {}",
            samples.len(),
            destination.path().display()
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_header(averages: u32) -> RecordHeader {
    RecordHeader {
        integration_ms: 60,
        sensitivity: "1 mV",
        time_constant_s: 1e-3,
        legacy: LEGACY_HEADER_PAIR,
        averages,
        start_mhz: 30000.0,
        stop_mhz: 30002.0,
        step_mhz: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let text = RecordWriter::format(&[0.5, 1.25, -3.0], &test_header(2));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "# integration_ms: 60");
        assert_eq!(lines[1], "# sensitivity: 1 mV");
        assert_eq!(lines[2], "# time_constant_s: 0.001");
        assert_eq!(lines[3], "# legacy: 15 75");
        assert_eq!(lines[4], "# averages: 2");
        assert_eq!(lines[8], "# points: 3");
        assert_eq!(&lines[9..], &["0.5", "1.25", "-3"]);
    }

    #[test]
    fn test_unaveraged_marker() {
        let text = RecordWriter::format(&[1.0], &test_header(0));
        assert!(text.contains("# averages: 0 (unaveraged partial sweep)"));
    }

    #[test]
    fn test_appends_identical_records() {
        let dir = tempfile::tempdir().unwrap();
        let dest = Destination::new(dir.path().join("scan.lwa"));
        let mut writer = RecordWriter;
        writer
            .write_record(&dest, &[1.0, 2.0], &test_header(1))
            .unwrap();
        writer
            .write_record(&dest, &[1.0, 2.0], &test_header(1))
            .unwrap();
        let text = std::fs::read_to_string(dest.path()).unwrap();
        let (first, second) = text.split_at(text.len() / 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = Destination::new(dir.path().join("missing").join("scan.lwa"));
        let err = RecordWriter
            .write_record(&dest, &[1.0], &test_header(1))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));
    }
}
