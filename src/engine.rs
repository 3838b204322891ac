//! The timed state machine that sweeps a single frequency window.
//!
//! Every point goes through the same cycle: tune the synthesizer, wait for the
//! settle delay, arm the lock-in buffer, wait for the integration delay, then
//! read and average the buffer. Only one delay is ever pending, and every
//! operator command cancels it before touching the sweep, so a stale timer
//! fire can never land on a window that has moved on.
//!
//! Instead of calling back into the batch scheduler, every entry point returns
//! a [`Signal`] telling the caller whether the window is finished.

use tracing::{debug, info, warn};

use crate::{
    axis::FrequencyAxis,
    checkpoint::Checkpointer,
    devices::{check_status, LockIn, Synthesizer},
    entry::ScanEntry,
    error::{DeviceError, PersistenceError, ScanError},
    instrument::Band,
    record::{Destination, Persistence},
    sweep::{Direction, Step, SweepState},
    timer::{Timer, TimerHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No window installed
    Idle,
    /// Synthesizer retuned, waiting for the settle delay
    Tuning,
    /// Settle delay elapsed, arming the lock-in
    Settling,
    /// Waiting for the integration delay
    Integrating,
    Paused,
    /// The window reached its target averages or was skipped
    Completed,
}

impl EngineState {
    fn is_running(self) -> bool {
        matches!(
            self,
            EngineState::Tuning | EngineState::Settling | EngineState::Integrating
        )
    }
}

/// What the batch scheduler should do after an engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    WindowDone,
    AbortBatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    Save,
    Discard,
}

/// Position of the engine within its window, for progress reporting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSnapshot {
    pub state: EngineState,
    pub index: usize,
    pub points: usize,
    pub direction: Direction,
    pub completed_averages: u32,
    pub target_averages: u32,
    pub frequency_mhz: f64,
}

struct Window {
    entry: ScanEntry,
    axis: FrequencyAxis,
    sweep: SweepState,
}

pub struct ScanEngine<S, L, P, T> {
    synth: S,
    lockin: L,
    timer: T,
    checkpointer: Checkpointer<P>,
    band: Band,
    destination: Option<Destination>,
    window: Option<Window>,
    state: EngineState,
    paused_from: Option<EngineState>,
    pending: Option<TimerHandle>,
}

impl<S, L, P, T> ScanEngine<S, L, P, T>
where
    S: Synthesizer,
    L: LockIn,
    P: Persistence,
    T: Timer,
{
    pub fn new(synth: S, lockin: L, persistence: P, timer: T, band: Band) -> Self {
        Self {
            synth,
            lockin,
            timer,
            checkpointer: Checkpointer::new(persistence),
            band,
            destination: None,
            window: None,
            state: EngineState::Idle,
            paused_from: None,
            pending: None,
        }
    }

    pub fn set_destination(&mut self, destination: Destination) {
        self.destination = Some(destination);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The phase a pause interrupted
    pub fn paused_from(&self) -> Option<EngineState> {
        self.paused_from
    }

    pub fn sweep(&self) -> Option<&SweepState> {
        self.window.as_ref().map(|w| &w.sweep)
    }

    pub fn axis(&self) -> Option<&FrequencyAxis> {
        self.window.as_ref().map(|w| &w.axis)
    }

    pub fn entry(&self) -> Option<&ScanEntry> {
        self.window.as_ref().map(|w| &w.entry)
    }

    pub fn snapshot(&self) -> Option<SweepSnapshot> {
        self.window.as_ref().map(|w| SweepSnapshot {
            state: self.state,
            index: w.sweep.index(),
            points: w.axis.len(),
            direction: w.sweep.direction(),
            completed_averages: w.sweep.completed_averages(),
            target_averages: w.entry.target_averages,
            frequency_mhz: w.axis[w.sweep.index()],
        })
    }

    pub fn synthesizer(&self) -> &S {
        &self.synth
    }

    pub fn synthesizer_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    pub fn lock_in(&self) -> &L {
        &self.lockin
    }

    pub fn lock_in_mut(&mut self) -> &mut L {
        &mut self.lockin
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn persistence(&self) -> &P {
        self.checkpointer.persistence()
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        self.checkpointer.persistence_mut()
    }

    /// Start sweeping a new window from scratch. Ignored unless the engine is
    /// idle or done with its previous window.
    pub fn install_entry(&mut self, entry: ScanEntry) -> Result<(), ScanError> {
        if !matches!(self.state, EngineState::Idle | EngineState::Completed) {
            warn!("Refusing to install a window while {:?}", self.state);
            return Ok(());
        }
        let axis = entry.axis()?;
        info!("Starting window {}", entry.describe());
        if entry.integrates_under_time_constant() {
            warn!(
                "Integration time of {} ms is shorter than the lock-in time constant",
                entry.integration_ms
            );
        }
        let sweep = SweepState::new(axis.len());
        let status = self
            .lockin
            .configure(entry.sensitivity_index, entry.time_constant_index);
        self.window = Some(Window { entry, axis, sweep });
        self.paused_from = None;
        if let Err(e) = check_status(status, "lock-in", None) {
            // Resuming accepts whatever the lock-in is currently set to
            self.state = EngineState::Paused;
            return Err(e.into());
        }
        self.tune()
    }

    /// Retune to the current point and start the settle delay. On a device
    /// error the engine is left without a pending delay until the operator acts.
    fn tune(&mut self) -> Result<(), ScanError> {
        let Some(window) = &self.window else {
            return Ok(());
        };
        self.state = EngineState::Tuning;
        let probe = window.axis[window.sweep.index()];
        let synth_freq = probe / self.band.multiplier();
        let settle = window.entry.settle_time();
        debug!(
            "Point {} at {:.3} MHz (synthesizer {:.6} MHz)",
            window.sweep.index(),
            probe,
            synth_freq
        );
        check_status(
            self.synth.set_frequency(synth_freq),
            "synthesizer",
            Some(synth_freq),
        )?;
        self.pending = Some(self.timer.schedule_once(settle));
        Ok(())
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.timer.cancel(handle);
        }
    }

    /// A scheduled delay elapsed. Fires that were cancelled or superseded are
    /// ignored.
    pub fn on_timer(&mut self, handle: TimerHandle) -> Result<Signal, ScanError> {
        if self.pending != Some(handle) {
            debug!("Ignoring stale timer {:?}", handle);
            return Ok(Signal::Continue);
        }
        self.cancel_pending();
        match self.state {
            EngineState::Tuning => {
                self.state = EngineState::Settling;
                self.lockin.arm_buffer()?;
                if let Some(window) = &self.window {
                    let integration = window.entry.integration_time();
                    self.pending = Some(self.timer.schedule_once(integration));
                    self.state = EngineState::Integrating;
                }
                Ok(Signal::Continue)
            }
            EngineState::Integrating => self.integrate(),
            _ => Ok(Signal::Continue),
        }
    }

    fn integrate(&mut self) -> Result<Signal, ScanError> {
        let samples = self.lockin.read_buffer()?;
        if samples.is_empty() {
            return Err(DeviceError::EmptyBuffer.into());
        }
        let value = samples.iter().sum::<f64>() / samples.len() as f64;
        let Some(window) = &mut self.window else {
            return Ok(Signal::Continue);
        };
        window.sweep.record(value);
        if window.sweep.advance() == Step::SweepDone {
            info!(
                "Finished average {} of {}",
                window.sweep.completed_averages(),
                window.entry.target_averages
            );
        }
        if window.sweep.completed_averages() >= window.entry.target_averages {
            self.state = EngineState::Completed;
            self.checkpoint()?;
            Ok(Signal::WindowDone)
        } else {
            self.tune()?;
            Ok(Signal::Continue)
        }
    }

    /// Hand the best estimate so far to the checkpointer
    fn checkpoint(&mut self) -> Result<(), ScanError> {
        let Some(window) = &self.window else {
            return Ok(());
        };
        let destination = self
            .destination
            .as_ref()
            .ok_or(PersistenceError::NoDestination)?;
        let tc = self
            .lockin
            .read_time_constant_index()
            .map_err(PersistenceError::Header)?;
        let (samples, averages) = window.sweep.checkpoint_source();
        self.checkpointer
            .persist(samples, averages, &window.entry, tc, destination)?;
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.cancel_pending();
        debug!("Paused while {:?}", self.state);
        self.paused_from = Some(self.state);
        self.state = EngineState::Paused;
    }

    /// Continue a paused sweep, starting over at the tuning step of the
    /// current point
    pub fn resume(&mut self) -> Result<(), ScanError> {
        if self.state != EngineState::Paused {
            return Ok(());
        }
        self.paused_from = None;
        self.tune()
    }

    /// Discard the in-progress sweep and start it again from its first point
    pub fn redo_sweep(&mut self) -> Result<(), ScanError> {
        if !(self.state.is_running() || self.state == EngineState::Paused) {
            return Ok(());
        }
        self.cancel_pending();
        if let Some(window) = &mut self.window {
            window.sweep.redo();
            info!("Redoing sweep {}", window.sweep.completed_averages() + 1);
        }
        self.paused_from = None;
        self.tune()
    }

    /// Discard every average of this window and start again
    pub fn restart_averages(&mut self) -> Result<(), ScanError> {
        if !(self.state.is_running() || self.state == EngineState::Paused) {
            return Ok(());
        }
        self.cancel_pending();
        if let Some(window) = &mut self.window {
            window.sweep.restart();
            info!("Restarted averaging of the current window");
        }
        self.paused_from = None;
        self.tune()
    }

    /// Persist the best estimate so far and carry on where we were. A paused
    /// engine stays paused. On a completed window whose final save failed this
    /// retries the save and moves on.
    pub fn save_and_continue(&mut self) -> Result<Signal, ScanError> {
        match self.state {
            EngineState::Idle => Ok(Signal::Continue),
            EngineState::Completed => {
                self.checkpoint()?;
                Ok(Signal::WindowDone)
            }
            EngineState::Paused => {
                self.checkpoint()?;
                Ok(Signal::Continue)
            }
            _ => {
                self.cancel_pending();
                // Keep acquiring even when the save fails; the sum is untouched
                let saved = self.checkpoint();
                let tuned = self.tune();
                saved?;
                tuned?;
                Ok(Signal::Continue)
            }
        }
    }

    /// Leave this window regardless of how many averages it has. If saving
    /// fails the engine is paused so the operator can retry.
    pub fn skip_window(&mut self, policy: SavePolicy) -> Result<Signal, ScanError> {
        if self.state == EngineState::Idle {
            return Ok(Signal::Continue);
        }
        self.cancel_pending();
        if policy == SavePolicy::Save {
            if let Err(e) = self.checkpoint() {
                if self.state.is_running() {
                    self.paused_from = Some(self.state);
                    self.state = EngineState::Paused;
                }
                return Err(e);
            }
        }
        info!("Skipping window ({:?})", policy);
        self.state = EngineState::Completed;
        self.paused_from = None;
        Ok(Signal::WindowDone)
    }

    /// Stop everything; nothing further is saved
    pub fn abort_batch(&mut self) -> Signal {
        self.cancel_pending();
        self.window = None;
        self.paused_from = None;
        self.state = EngineState::Idle;
        Signal::AbortBatch
    }
}
