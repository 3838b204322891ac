//! Turning accumulated sweeps into records, and estimating how long a batch runs

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::info;

use crate::{
    axis::FrequencyAxis,
    entry::ScanEntry,
    error::PersistenceError,
    instrument::{sensitivity_label, time_constant_seconds},
    record::{Destination, Persistence, RecordHeader, LEGACY_HEADER_PAIR},
};

pub struct Checkpointer<P> {
    persistence: P,
}

impl<P: Persistence> Checkpointer<P> {
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    /// Write `samples / average_count` to `destination`. With no completed
    /// averages the raw samples are written and the header says so.
    pub fn persist(
        &mut self,
        samples: &[f64],
        average_count: u32,
        entry: &ScanEntry,
        time_constant_index: usize,
        destination: &Destination,
    ) -> Result<(), PersistenceError> {
        let header = RecordHeader {
            integration_ms: entry.integration_ms,
            sensitivity: sensitivity_label(entry.sensitivity_index).unwrap_or("unknown"),
            time_constant_s: time_constant_seconds(time_constant_index).unwrap_or(f64::NAN),
            legacy: LEGACY_HEADER_PAIR,
            averages: average_count,
            start_mhz: entry.start_freq,
            stop_mhz: entry.stop_freq,
            step_mhz: entry.step,
        };
        let averaged: Vec<f64>;
        let out = if average_count > 0 {
            let n = average_count as f64;
            averaged = samples.iter().map(|s| s / n).collect();
            &averaged[..]
        } else {
            samples
        };
        self.persistence.write_record(destination, out, &header)?;
        info!(
            "Saved {} -- {} MHz ({} averages) to {}",
            entry.start_freq,
            entry.stop_freq,
            average_count,
            destination.path().display()
        );
        Ok(())
    }
}

/// Wall-clock time the batch needs if nobody intervenes. Saturates instead of
/// overflowing for absurdly long entries.
pub fn estimate_duration(entries: &[ScanEntry]) -> Duration {
    entries
        .iter()
        .map(|e| {
            let points =
                FrequencyAxis::point_count(e.start_freq, e.stop_freq, e.step).unwrap_or(0) as u64;
            Duration::from_millis(
                points
                    .saturating_mul(e.target_averages as u64)
                    .saturating_mul(e.integration_ms.saturating_add(e.settle_ms)),
            )
        })
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Format a duration like `H:MM:SS`, with a `N day(s), ` prefix past 24 hours
fn hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    let clock = format!(
        "{}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    );
    match secs / 86_400 {
        0 => clock,
        1 => format!("1 day, {clock}"),
        days => format!("{days} days, {clock}"),
    }
}

/// The confirmation text shown before a batch starts
pub fn format_estimate(entries: &[ScanEntry], now: DateTime<Local>) -> String {
    let length = estimate_duration(entries);
    // Durations this long don't happen, so falling back to `now` is fine
    let then = chrono::Duration::from_std(length)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now);
    format!(
        "This batch job is estimated to take {}.\nIt is expected to finish at {}.",
        hms(length),
        then.format("%I:%M %p, %m-%d-%Y (%a)")
    )
}
