pub mod args;
pub mod axis;
pub mod checkpoint;
pub mod config;
pub mod devices;
pub mod engine;
pub mod entry;
pub mod error;
pub mod instrument;
pub mod monitoring;
pub mod record;
pub mod scheduler;
pub mod sweep;
pub mod timer;

#[cfg(test)]
mod mock;

pub use axis::FrequencyAxis;
pub use engine::{EngineState, SavePolicy, ScanEngine, Signal};
pub use entry::ScanEntry;
pub use scheduler::{BatchReport, BatchScheduler, BatchStatus, Command};
pub use sweep::SweepState;
