//! Error types for the scanner

use std::path::PathBuf;

use thiserror::Error;

/// A frequency window that cannot be turned into an axis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidRangeError {
    #[error("Frequency step must be positive, got {0} MHz")]
    NonPositiveStep(f64),
    #[error("Start and stop frequency are both {0} MHz; the window is empty")]
    EmptyRange(f64),
    #[error("Frequency window {start} -- {stop} MHz is not finite")]
    NotFinite { start: f64, stop: f64 },
}

/// A scan entry the operator supplied that we refuse to run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntryError {
    #[error(transparent)]
    Range(#[from] InvalidRangeError),
    #[error("Target averages must be at least 1")]
    NoAverages,
    #[error("Sensitivity index {0} is not a known lock-in sensitivity")]
    Sensitivity(usize),
    #[error("Time constant index {0} is not a known lock-in time constant")]
    TimeConstant(usize),
    #[error("Integration time must be positive")]
    NoIntegration,
    #[error("Settle time must be positive")]
    NoSettle,
    #[error("VDI band index {0} does not exist")]
    Band(usize),
}

/// Failures reported by the synthesizer or lock-in
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Synthesizer refused {0} MHz: out of range")]
    OutOfRange(f64),
    #[error("Communication with the {0} failed")]
    Comm(&'static str),
    #[error("Lock-in returned an empty buffer")]
    EmptyBuffer,
    #[error("Lock-in transport failure: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Couldn't write record to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No destination file has been set for this batch")]
    NoDestination,
    #[error("Couldn't read lock-in time constant for the record header: {0}")]
    Header(#[from] DeviceError),
}

/// Problems loading a batch file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Couldn't read batch file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Couldn't parse batch file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Batch file {} has no entries", .0.display())]
    Empty(PathBuf),
    #[error("Batch file {} selects VDI band {index}, which does not exist", path.display())]
    Band { path: PathBuf, index: usize },
    #[error("Entry {index} is invalid: {source}")]
    Entry { index: usize, source: EntryError },
}

/// Anything that can go wrong while a scan is in progress
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
