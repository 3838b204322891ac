//! Fixed hardware tables of the lock-in amplifier and the VDI multiplier chain

use crate::error::EntryError;

/// Lock-in sensitivity settings, indexed by the value sent to the instrument
pub const LIA_SENSITIVITIES: [&str; 27] = [
    "2 nV", "5 nV", "10 nV", "20 nV", "50 nV", "100 nV", "200 nV", "500 nV", "1 uV", "2 uV",
    "5 uV", "10 uV", "20 uV", "50 uV", "100 uV", "200 uV", "500 uV", "1 mV", "2 mV", "5 mV",
    "10 mV", "20 mV", "50 mV", "100 mV", "200 mV", "500 mV", "1 V",
];

/// Lock-in time constants in milliseconds
pub const LIA_TIME_CONSTANTS_MS: [f64; 20] = [
    0.01, 0.03, 0.1, 0.3, 1.0, 3.0, 10.0, 30.0, 100.0, 300.0, 1e3, 3e3, 1e4, 3e4, 1e5, 3e5, 1e6,
    3e6, 1e7, 3e7,
];

pub const LIA_TIME_CONSTANT_LABELS: [&str; 20] = [
    "10 us", "30 us", "100 us", "300 us", "1 ms", "3 ms", "10 ms", "30 ms", "100 ms", "300 ms",
    "1 s", "3 s", "10 s", "30 s", "100 s", "300 s", "1 ks", "3 ks", "10 ks", "30 ks",
];

// (label, frequency multiplication factor)
const VDI_BANDS: [(&str, u32); 10] = [
    ("1 (x1): 0-50 GHz", 1),
    ("2 (x2): GHz", 2),
    ("3 (x3): 70-110 GHz", 3),
    ("4 (x3): 110-140 GHz", 3),
    ("5 (x6): 140-220 GHz", 6),
    ("6 (x9): 220-330 GHz", 9),
    ("7 (x12): 325-430 GHz", 12),
    ("8a (x18): 430-700 GHz", 18),
    ("8b (x27): 600-850 GHz", 27),
    ("9 (x27): 700-1000 GHz", 27),
];

pub fn sensitivity_label(index: usize) -> Option<&'static str> {
    LIA_SENSITIVITIES.get(index).copied()
}

/// Time constant in seconds, as written into record headers
pub fn time_constant_seconds(index: usize) -> Option<f64> {
    LIA_TIME_CONSTANTS_MS.get(index).map(|ms| ms * 1e-3)
}

/// One stage of the VDI multiplier chain. The synthesizer is tuned to the
/// probing frequency divided by the band multiplier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    index: usize,
}

impl Band {
    pub fn new(index: usize) -> Result<Self, EntryError> {
        if index < VDI_BANDS.len() {
            Ok(Self { index })
        } else {
            Err(EntryError::Band(index))
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn multiplier(&self) -> f64 {
        VDI_BANDS[self.index].1 as f64
    }

    pub fn label(&self) -> &'static str {
        VDI_BANDS[self.index].0
    }
}
