//! Scripted collaborators for unit tests

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crossbeam_channel::Receiver;

use crate::{
    devices::{DeviceStatus, LockIn, Synthesizer},
    error::{DeviceError, PersistenceError},
    record::{Destination, Persistence, RecordHeader},
    timer::{Timer, TimerHandle},
};

#[derive(Debug, Default)]
pub struct MockSynth {
    pub tuned: Vec<f64>,
    pub refuse: VecDeque<DeviceStatus>,
}

impl Synthesizer for MockSynth {
    fn set_frequency(&mut self, mhz: f64) -> DeviceStatus {
        if let Some(status) = self.refuse.pop_front() {
            return status;
        }
        self.tuned.push(mhz);
        DeviceStatus::Ok
    }

    fn read_frequency(&mut self) -> Result<f64, DeviceError> {
        self.tuned.last().copied().ok_or(DeviceError::Comm("synthesizer"))
    }
}

/// Every read returns samples averaging to the number of reads so far
#[derive(Debug, Default)]
pub struct MockLockIn {
    pub configured: Vec<(usize, usize)>,
    pub arms: usize,
    pub reads: usize,
    pub failures: VecDeque<DeviceError>,
    pub refuse_configure: bool,
}

impl LockIn for MockLockIn {
    fn configure(&mut self, sensitivity_index: usize, time_constant_index: usize) -> DeviceStatus {
        if self.refuse_configure {
            return DeviceStatus::CommError;
        }
        self.configured
            .push((sensitivity_index, time_constant_index));
        DeviceStatus::Ok
    }

    fn arm_buffer(&mut self) -> Result<(), DeviceError> {
        self.arms += 1;
        Ok(())
    }

    fn read_buffer(&mut self) -> Result<Vec<f64>, DeviceError> {
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.reads += 1;
        let r = self.reads as f64;
        Ok(vec![r - 0.5, r + 0.5])
    }

    fn read_time_constant_index(&mut self) -> Result<usize, DeviceError> {
        Ok(self.configured.last().map_or(0, |c| c.1))
    }
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub records: Vec<(Destination, Vec<f64>, RecordHeader)>,
    pub fail: bool,
}

impl Persistence for Recorded {
    fn write_record(
        &mut self,
        destination: &Destination,
        samples: &[f64],
        header: &RecordHeader,
    ) -> Result<(), PersistenceError> {
        if self.fail {
            return Err(PersistenceError::Io {
                path: destination.path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.records
            .push((destination.clone(), samples.to_vec(), header.clone()));
        Ok(())
    }
}

/// Timer that never fires by itself; tests fire the pending handle by hand
#[derive(Debug, Default)]
pub struct ManualTimer {
    next_id: u64,
    pub pending: Option<(TimerHandle, Duration)>,
    pub scheduled: Vec<Duration>,
    pub cancelled: usize,
}

impl Timer for ManualTimer {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        assert!(
            self.pending.is_none(),
            "scheduled a delay while another was pending"
        );
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.pending = Some((handle, delay));
        self.scheduled.push(delay);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if matches!(self.pending, Some((pending, _)) if pending == handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }

    fn expiry(&self) -> Option<(TimerHandle, Receiver<Instant>)> {
        None
    }
}
