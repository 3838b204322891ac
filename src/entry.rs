//! Operator-supplied configuration of one frequency window

use std::time::Duration;

use serde::Deserialize;

use crate::{
    axis::FrequencyAxis,
    error::EntryError,
    instrument::{sensitivity_label, LIA_TIME_CONSTANTS_MS, LIA_TIME_CONSTANT_LABELS},
};

/// One window of a batch: where to sweep, how often, and how the lock-in is set
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanEntry {
    #[serde(rename = "start_mhz")]
    pub start_freq: f64,
    #[serde(rename = "stop_mhz")]
    pub stop_freq: f64,
    #[serde(rename = "step_mhz")]
    pub step: f64,
    #[serde(rename = "averages")]
    pub target_averages: u32,
    #[serde(rename = "sensitivity")]
    pub sensitivity_index: usize,
    #[serde(rename = "time_constant")]
    pub time_constant_index: usize,
    pub integration_ms: u64,
    pub settle_ms: u64,
}

impl ScanEntry {
    /// Check everything the scan engine relies on, returning the number of
    /// points the window would sweep
    pub fn validate(&self) -> Result<usize, EntryError> {
        let points = FrequencyAxis::point_count(self.start_freq, self.stop_freq, self.step)?;
        if self.target_averages == 0 {
            return Err(EntryError::NoAverages);
        }
        if sensitivity_label(self.sensitivity_index).is_none() {
            return Err(EntryError::Sensitivity(self.sensitivity_index));
        }
        if self.time_constant_index >= LIA_TIME_CONSTANTS_MS.len() {
            return Err(EntryError::TimeConstant(self.time_constant_index));
        }
        if self.integration_ms == 0 {
            return Err(EntryError::NoIntegration);
        }
        if self.settle_ms == 0 {
            return Err(EntryError::NoSettle);
        }
        Ok(points)
    }

    /// Validate and build the axis the window sweeps
    pub fn axis(&self) -> Result<FrequencyAxis, EntryError> {
        self.validate()?;
        Ok(FrequencyAxis::generate(
            self.start_freq,
            self.stop_freq,
            self.step,
        )?)
    }

    /// The lock-in won't have settled on a reading integrated for less than
    /// its time constant
    pub fn integrates_under_time_constant(&self) -> bool {
        LIA_TIME_CONSTANTS_MS
            .get(self.time_constant_index)
            .map_or(false, |&tc_ms| (self.integration_ms as f64) < tc_ms)
    }

    pub fn integration_time(&self) -> Duration {
        Duration::from_millis(self.integration_ms)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Human readable one-liner for the batch listing
    pub fn describe(&self) -> String {
        format!(
            "{:.3} -- {:.3} MHz; step={:.3} MHz; avg={}; sens={}; tc={}; itgtime={} ms; waittime={} ms",
            self.start_freq,
            self.stop_freq,
            self.step,
            self.target_averages,
            sensitivity_label(self.sensitivity_index).unwrap_or("?"),
            LIA_TIME_CONSTANT_LABELS
                .get(self.time_constant_index)
                .copied()
                .unwrap_or("?"),
            self.integration_ms,
            self.settle_ms
        )
    }
}

#[cfg(test)]
pub(crate) fn test_entry(start: f64, stop: f64, averages: u32) -> ScanEntry {
    ScanEntry {
        start_freq: start,
        stop_freq: stop,
        step: 1.0,
        target_averages: averages,
        sensitivity_index: 17,
        time_constant_index: 4,
        integration_ms: 60,
        settle_ms: 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidRangeError;

    #[test]
    fn test_valid_entry() {
        let entry = test_entry(30000.0, 30010.0, 2);
        assert_eq!(entry.validate(), Ok(11));
        assert_eq!(entry.axis().unwrap().len(), 11);
        assert_eq!(entry.integration_time(), Duration::from_millis(60));
    }

    #[test]
    fn test_short_integration() {
        let mut entry = test_entry(30000.0, 30010.0, 2);
        assert!(!entry.integrates_under_time_constant());
        // 100 ms time constant
        entry.time_constant_index = 8;
        assert!(entry.integrates_under_time_constant());
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_invalid_entries() {
        let mut entry = test_entry(30000.0, 30010.0, 2);
        entry.step = 0.0;
        assert_eq!(
            entry.validate(),
            Err(EntryError::Range(InvalidRangeError::NonPositiveStep(0.0)))
        );

        let mut entry = test_entry(30000.0, 30010.0, 0);
        assert_eq!(entry.validate(), Err(EntryError::NoAverages));
        entry.target_averages = 1;
        entry.sensitivity_index = 27;
        assert_eq!(entry.validate(), Err(EntryError::Sensitivity(27)));
        entry.sensitivity_index = 0;
        entry.time_constant_index = 20;
        assert_eq!(entry.validate(), Err(EntryError::TimeConstant(20)));
        entry.time_constant_index = 0;
        entry.integration_ms = 0;
        assert_eq!(entry.validate(), Err(EntryError::NoIntegration));
        entry.integration_ms = 1;
        entry.settle_ms = 0;
        assert_eq!(entry.validate(), Err(EntryError::NoSettle));
    }

    #[test]
    fn test_parse_from_toml() {
        let entry: ScanEntry = toml::from_str(
            r#"
            start_mhz = 30000.0
            stop_mhz = 30010.0
            step_mhz = 1.0
            averages = 2
            sensitivity = 17
            time_constant = 4
            integration_ms = 60
            settle_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(entry, test_entry(30000.0, 30010.0, 2));
    }
}
