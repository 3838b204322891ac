//! Runs a batch of windows one after another through a single scan engine

use crossbeam_channel::{never, select, Receiver, Sender};
use tracing::{error, info, warn};

use crate::{
    devices::{LockIn, Synthesizer},
    engine::{SavePolicy, ScanEngine, Signal, SweepSnapshot},
    entry::ScanEntry,
    error::ScanError,
    record::{Destination, Persistence},
    timer::{Timer, TimerHandle},
};

/// Operator interventions, forwarded to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    RedoSweep,
    /// Only send this once the operator confirmed losing every average
    RestartAverages,
    SaveAndContinue,
    SkipWindow(SavePolicy),
    AbortBatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Running,
    Finished,
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    WindowStarted,
    Point,
    WindowDone,
    BatchFinished,
    BatchAborted,
    Error(String),
}

/// Pushed to whoever is watching the batch
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub event: ProgressEvent,
    pub entry_index: Option<usize>,
    pub entry_count: usize,
    pub sweep: Option<SweepSnapshot>,
}

/// How a call to [`BatchScheduler::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub windows_done: usize,
}

enum Wake {
    Command(Command),
    OperatorGone,
    Fired,
}

pub struct BatchScheduler<S, L, P, T> {
    engine: ScanEngine<S, L, P, T>,
    entries: Vec<ScanEntry>,
    current: Option<usize>,
    windows_done: usize,
    status: BatchStatus,
    progress: Option<Sender<Progress>>,
}

impl<S, L, P, T> BatchScheduler<S, L, P, T>
where
    S: Synthesizer,
    L: LockIn,
    P: Persistence,
    T: Timer,
{
    pub fn new(engine: ScanEngine<S, L, P, T>) -> Self {
        Self {
            engine,
            entries: vec![],
            current: None,
            windows_done: 0,
            status: BatchStatus::Finished,
            progress: None,
        }
    }

    /// Send progress to `sender`. Sending never blocks; updates are dropped if
    /// the receiver falls behind.
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn engine(&self) -> &ScanEngine<S, L, P, T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ScanEngine<S, L, P, T> {
        &mut self.engine
    }

    pub fn current_entry_index(&self) -> Option<usize> {
        self.current
    }

    pub fn windows_done(&self) -> usize {
        self.windows_done
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.try_send(Progress {
                event,
                entry_index: self.current,
                entry_count: self.entries.len(),
                sweep: self.engine.snapshot(),
            });
        }
    }

    fn report(&self, err: &ScanError) {
        error!("{}", err);
        self.notify(ProgressEvent::Error(err.to_string()));
    }

    /// Begin a batch with the first entry. Every entry is checked first, so
    /// a bad one stops the batch before anything is sent to the hardware.
    /// Device errors on the first window are reported like on any other and
    /// left for the operator. Ignored while a batch is already running.
    pub fn start(
        &mut self,
        entries: Vec<ScanEntry>,
        destination: Destination,
    ) -> Result<BatchStatus, ScanError> {
        if self.status == BatchStatus::Running {
            warn!("A batch is already running; not starting another");
            return Ok(self.status);
        }
        for (i, entry) in entries.iter().enumerate() {
            if let Err(e) = entry.validate() {
                error!("Batch entry {} is invalid", i);
                return Err(e.into());
            }
        }
        info!(
            "Starting batch of {} windows, saving to {}",
            entries.len(),
            destination.path().display()
        );
        self.engine.set_destination(destination);
        self.entries = entries;
        self.current = None;
        self.windows_done = 0;
        self.status = BatchStatus::Running;
        match self.next_entry() {
            Ok(status) => Ok(status),
            Err(e) => {
                self.report(&e);
                Ok(self.status)
            }
        }
    }

    fn next_entry(&mut self) -> Result<BatchStatus, ScanError> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next);
        match self.entries.get(next) {
            Some(entry) => {
                info!("Window {} of {}", next + 1, self.entries.len());
                let installed = self.engine.install_entry(entry.clone());
                self.notify(ProgressEvent::WindowStarted);
                installed.map(|_| BatchStatus::Running)
            }
            None => {
                info!("Batch finished after {} windows", self.windows_done);
                self.status = BatchStatus::Finished;
                self.notify(ProgressEvent::BatchFinished);
                Ok(BatchStatus::Finished)
            }
        }
    }

    /// The engine finished or skipped its window
    pub fn on_window_done(&mut self) -> Result<BatchStatus, ScanError> {
        if self.status != BatchStatus::Running {
            return Ok(self.status);
        }
        self.windows_done += 1;
        self.notify(ProgressEvent::WindowDone);
        self.next_entry()
    }

    /// Tear the batch down without starting any more windows
    pub fn on_abort(&mut self) -> BatchStatus {
        if self.status == BatchStatus::Running {
            warn!(
                "Batch aborted with {} of {} windows done",
                self.windows_done,
                self.entries.len()
            );
            self.engine.abort_batch();
            self.status = BatchStatus::Aborted;
            self.notify(ProgressEvent::BatchAborted);
        }
        self.status
    }

    fn follow(&mut self, signal: Signal) -> Result<BatchStatus, ScanError> {
        match signal {
            Signal::Continue => Ok(self.status),
            Signal::WindowDone => self.on_window_done(),
            Signal::AbortBatch => Ok(self.on_abort()),
        }
    }

    pub fn on_timer(&mut self, handle: TimerHandle) -> Result<BatchStatus, ScanError> {
        if self.status != BatchStatus::Running {
            return Ok(self.status);
        }
        let signal = self.engine.on_timer(handle)?;
        if signal == Signal::Continue {
            self.notify(ProgressEvent::Point);
        }
        self.follow(signal)
    }

    pub fn command(&mut self, command: Command) -> Result<BatchStatus, ScanError> {
        if self.status != BatchStatus::Running {
            return Ok(self.status);
        }
        info!("Operator: {:?}", command);
        let signal = match command {
            Command::Pause => {
                self.engine.pause();
                Signal::Continue
            }
            Command::Resume => self.engine.resume().map(|_| Signal::Continue)?,
            Command::RedoSweep => self.engine.redo_sweep().map(|_| Signal::Continue)?,
            Command::RestartAverages => {
                self.engine.restart_averages().map(|_| Signal::Continue)?
            }
            Command::SaveAndContinue => self.engine.save_and_continue()?,
            Command::SkipWindow(policy) => self.engine.skip_window(policy)?,
            Command::AbortBatch => self.engine.abort_batch(),
        };
        self.notify(ProgressEvent::Point);
        self.follow(signal)
    }

    /// Drive the running batch until it finishes or is aborted, waiting on
    /// operator commands and the engine's pending delay. Errors are reported
    /// and left for the operator to deal with.
    pub fn run(&mut self, commands: Receiver<Command>) -> BatchReport {
        let mut commands = commands;
        let mut operator_gone = false;
        while self.status == BatchStatus::Running {
            let (handle, fired) = match self.engine.timer().expiry() {
                Some((handle, rx)) => (Some(handle), rx),
                None => (None, never()),
            };
            if handle.is_none() && operator_gone {
                warn!("Acquisition is stalled and no operator is connected");
                self.on_abort();
                break;
            }
            let wake = select! {
                recv(commands) -> cmd => cmd.map_or(Wake::OperatorGone, Wake::Command),
                recv(fired) -> _ => Wake::Fired,
            };
            let result = match (wake, handle) {
                (Wake::Command(cmd), _) => self.command(cmd),
                (Wake::Fired, Some(handle)) => self.on_timer(handle),
                (Wake::Fired, None) => continue,
                (Wake::OperatorGone, _) => {
                    info!("Operator input closed");
                    operator_gone = true;
                    commands = never();
                    continue;
                }
            };
            if let Err(e) = result {
                self.report(&e);
            }
        }
        BatchReport {
            status: self.status,
            windows_done: self.windows_done,
        }
    }
}
