//! Interfaces to the synthesizer and lock-in amplifier.
//!
//! How commands reach the hardware is up to the implementor; the scan engine
//! only ever calls these from its single control thread.

use rand::prelude::*;
use tracing::{debug, trace};

use crate::{
    error::DeviceError,
    instrument::{sensitivity_label, LIA_TIME_CONSTANT_LABELS},
};

/// Result of a synthesizer or lock-in setting command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ok,
    OutOfRange,
    CommError,
}

pub trait Synthesizer {
    /// Tune the synthesizer output (not the multiplied probing frequency)
    fn set_frequency(&mut self, mhz: f64) -> DeviceStatus;
    fn read_frequency(&mut self) -> Result<f64, DeviceError>;
}

pub trait LockIn {
    fn configure(&mut self, sensitivity_index: usize, time_constant_index: usize) -> DeviceStatus;
    /// Clear the sample buffer and start filling it
    fn arm_buffer(&mut self) -> Result<(), DeviceError>;
    /// Stop filling and return everything captured since the last arm
    fn read_buffer(&mut self) -> Result<Vec<f64>, DeviceError>;
    fn read_time_constant_index(&mut self) -> Result<usize, DeviceError>;
}

/// Synthesizer stand-in that remembers what it was tuned to
#[derive(Debug, Default)]
pub struct SimulatedSynthesizer {
    frequency: f64,
}

impl Synthesizer for SimulatedSynthesizer {
    fn set_frequency(&mut self, mhz: f64) -> DeviceStatus {
        if !mhz.is_finite() || mhz <= 0.0 {
            return DeviceStatus::OutOfRange;
        }
        trace!("Tune synthesizer to {:.3} MHz", mhz);
        self.frequency = mhz;
        DeviceStatus::Ok
    }

    fn read_frequency(&mut self) -> Result<f64, DeviceError> {
        Ok(self.frequency)
    }
}

/// Lock-in stand-in producing uniformly random readings
#[derive(Debug)]
pub struct SimulatedLockIn {
    rng: StdRng,
    time_constant: usize,
    samples_per_read: usize,
    armed: bool,
}

impl SimulatedLockIn {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            time_constant: 0,
            samples_per_read: 32,
            armed: false,
        }
    }
}

impl LockIn for SimulatedLockIn {
    fn configure(&mut self, sensitivity_index: usize, time_constant_index: usize) -> DeviceStatus {
        let (Some(sens), Some(tc)) = (
            sensitivity_label(sensitivity_index),
            LIA_TIME_CONSTANT_LABELS.get(time_constant_index),
        ) else {
            return DeviceStatus::OutOfRange;
        };
        debug!("Lock-in sensitivity {}, time constant {}", sens, tc);
        self.time_constant = time_constant_index;
        DeviceStatus::Ok
    }

    fn arm_buffer(&mut self) -> Result<(), DeviceError> {
        self.armed = true;
        Ok(())
    }

    fn read_buffer(&mut self) -> Result<Vec<f64>, DeviceError> {
        if !std::mem::take(&mut self.armed) {
            return Err(DeviceError::EmptyBuffer);
        }
        Ok((0..self.samples_per_read).map(|_| self.rng.gen()).collect())
    }

    fn read_time_constant_index(&mut self) -> Result<usize, DeviceError> {
        Ok(self.time_constant)
    }
}

/// Check a setting command went through
pub(crate) fn check_status(
    status: DeviceStatus,
    device: &'static str,
    mhz: Option<f64>,
) -> Result<(), DeviceError> {
    match (status, mhz) {
        (DeviceStatus::Ok, _) => Ok(()),
        (DeviceStatus::OutOfRange, Some(mhz)) => Err(DeviceError::OutOfRange(mhz)),
        (DeviceStatus::OutOfRange, None) => Err(DeviceError::Transport(format!(
            "{device} rejected a setting as out of range"
        ))),
        (DeviceStatus::CommError, _) => Err(DeviceError::Comm(device)),
    }
}
