//! Single-shot, cancelable delays driving the scan engine

use std::time::{Duration, Instant};

use crossbeam_channel::{after, Receiver};

/// Identifies one `schedule_once` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

pub trait Timer {
    /// Arrange for `delay` to elapse once. The fire is delivered back to the
    /// control loop; it is never delivered after `cancel` with the same handle.
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
    /// The pending delay, if any, for a control loop to wait on
    fn expiry(&self) -> Option<(TimerHandle, Receiver<Instant>)>;
}

/// Timer backed by crossbeam's deadline channels. Only one delay is pending at
/// a time; scheduling another replaces it.
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    next_id: u64,
    pending: Option<(TimerHandle, Receiver<Instant>)>,
}

impl Timer for DeadlineTimer {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending = Some((handle, after(delay)));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if matches!(self.pending, Some((pending, _)) if pending == handle) {
            self.pending = None;
        }
    }

    fn expiry(&self) -> Option<(TimerHandle, Receiver<Instant>)> {
        self.pending.clone()
    }
}
