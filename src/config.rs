//! Batch files: a TOML list of windows to scan
//!
//! ```toml
//! band = 4
//!
//! [[entry]]
//! start_mhz = 30000.0
//! stop_mhz = 30010.0
//! step_mhz = 1.0
//! averages = 2
//! sensitivity = 17
//! time_constant = 4
//! integration_ms = 60
//! settle_ms = 10
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{entry::ScanEntry, error::ConfigError, instrument::Band};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
    /// VDI band index; band 0 (no multiplication) if missing
    pub band: Option<usize>,
    #[serde(rename = "entry", default)]
    pub entries: Vec<ScanEntry>,
}

impl BatchFile {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let batch: BatchFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if batch.entries.is_empty() {
            return Err(ConfigError::Empty(path.to_path_buf()));
        }
        for (index, entry) in batch.entries.iter().enumerate() {
            entry
                .validate()
                .map_err(|source| ConfigError::Entry { index, source })?;
        }
        if let Some(band) = batch.band {
            Band::new(band).map_err(|_| ConfigError::Band {
                path: path.to_path_buf(),
                index: band,
            })?;
        }
        Ok(batch)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }
}
