use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::duration::{parse_offset, ClockTime};
use super::errors::ClockError;
use super::events::{ClockControl, ClockEvent, ClockEventKind};

const CONTROL_CAPACITY: usize = 16;
const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockStatus {
    Fresh,
    Playing,
    Paused,
    Done,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    pub period_length: ClockTime,
    pub period_count: u32,
    /// Wall-clock time between ticks; each tick takes one second off the clock
    pub tick: Duration,
}

impl ClockSettings {
    pub fn new(period_length: ClockTime, period_count: u32) -> Self {
        Self {
            period_length,
            period_count,
            tick: Duration::from_secs(1),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn overtime_length(&self) -> ClockTime {
        self.period_length.half()
    }

    /// What `Reset` restores: the full length in regulation, half of it in overtime.
    pub fn length_of(&self, period: u32) -> ClockTime {
        if period <= self.period_count {
            self.period_length
        } else {
            self.overtime_length()
        }
    }
}

/// Point-in-time view of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockStatusView {
    pub status: ClockStatus,
    pub current: ClockTime,
    pub period: u32,
}

/// The clock's state machine, free of any scheduling.
#[derive(Debug, Clone)]
pub struct ClockState {
    settings: ClockSettings,
    status: ClockStatus,
    current: ClockTime,
    period: u32,
}

impl ClockState {
    pub fn new(settings: ClockSettings) -> Self {
        Self {
            settings,
            status: ClockStatus::Fresh,
            current: settings.period_length,
            period: 1,
        }
    }

    pub fn view(&self) -> ClockStatusView {
        ClockStatusView {
            status: self.status,
            current: self.current,
            period: self.period,
        }
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    /// Applies one control; returns the event to emit, if any.
    pub fn apply(&mut self, control: ClockControl) -> Option<ClockEvent> {
        use ClockStatus::*;

        match (control, self.status) {
            (_, Closed) => None,

            (ClockControl::Play, Fresh | Paused) if !self.current.is_zero() => {
                self.status = Playing;
                Some(ClockEvent::new(
                    ClockEventKind::Transport,
                    self.current.to_string(),
                ))
            }

            (ClockControl::Pause, Playing) => {
                self.status = Paused;
                Some(ClockEvent::new(ClockEventKind::Transport, ""))
            }

            // Nothing but Pause reaches a running clock
            (_, Playing) => None,

            (ClockControl::Reset, _) => {
                self.status = Fresh;
                self.current = self.settings.length_of(self.period);
                Some(self.clock_set())
            }

            (ClockControl::Set(value), _) => {
                let time = value.parse::<ClockTime>().ok()?;
                self.current = time;
                self.leave_done();
                Some(self.clock_set())
            }

            (ClockControl::Adjust(value), _) => {
                let offset = parse_offset(&value).ok()?;
                self.current = self.current.offset(offset);
                self.leave_done();
                Some(self.clock_set())
            }

            (ClockControl::ChangePeriod(delta), Fresh | Done) => {
                self.period = (self.period as i64 + delta as i64).max(1) as u32;
                self.current = self.settings.period_length;
                self.status = Fresh;
                Some(ClockEvent::new(
                    ClockEventKind::PeriodSet,
                    format!("{}/{}", self.period, self.settings.period_count),
                ))
            }

            (ClockControl::Close, _) => {
                self.status = Closed;
                None
            }

            _ => None,
        }
    }

    /// One second off the clock. Reaching zero finishes the period.
    pub fn tick(&mut self) -> Option<ClockEvent> {
        if self.status != ClockStatus::Playing {
            return None;
        }

        if self.current.as_secs() <= 1 {
            self.current = ClockTime::ZERO;
            self.status = ClockStatus::Done;
            return Some(ClockEvent::new(ClockEventKind::Done, ""));
        }

        self.current = self.current.offset(-1);
        Some(ClockEvent::new(ClockEventKind::Tick, self.current.to_string()))
    }

    fn clock_set(&self) -> ClockEvent {
        ClockEvent::new(ClockEventKind::ClockSet, self.current.to_string())
    }

    /// Putting time back on a finished clock makes it playable again.
    fn leave_done(&mut self) {
        if self.status == ClockStatus::Done && !self.current.is_zero() {
            self.status = ClockStatus::Paused;
        }
    }
}

/// Handle to a running clock worker.
#[derive(Debug, Clone)]
pub struct GameClock {
    controls: mpsc::Sender<ClockControl>,
    status: watch::Receiver<ClockStatusView>,
}

impl GameClock {
    /// Spawns the control loop and returns the handle plus the event stream.
    ///
    /// The stream ends once the clock is closed or every handle is dropped.
    pub fn spawn(settings: ClockSettings) -> (GameClock, mpsc::Receiver<ClockEvent>) {
        let state = ClockState::new(settings);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let (status_tx, status_rx) = watch::channel(state.view());

        tokio::spawn(run_clock(state, settings.tick, control_rx, event_tx, status_tx));

        (
            GameClock {
                controls: control_tx,
                status: status_rx,
            },
            event_rx,
        )
    }

    pub async fn send(&self, control: ClockControl) -> Result<(), ClockError> {
        self.controls
            .send(control)
            .await
            .map_err(|_| ClockError::Closed)
    }

    /// Non-blocking variant for callers that must never wait on the clock.
    pub fn try_send(&self, control: ClockControl) -> Result<(), ClockError> {
        self.controls
            .try_send(control)
            .map_err(|_| ClockError::Closed)
    }

    pub fn view(&self) -> ClockStatusView {
        *self.status.borrow()
    }
}

/// Dropping the ticker stops its task.
struct Ticker {
    generation: u64,
    _stop: oneshot::Sender<()>,
}

fn spawn_ticker(period: Duration, generation: u64, ticks: mpsc::Sender<u64>) -> Ticker {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = interval.tick() => {
                    if ticks.send(generation).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    Ticker {
        generation,
        _stop: stop_tx,
    }
}

async fn run_clock(
    mut state: ClockState,
    tick: Duration,
    mut controls: mpsc::Receiver<ClockControl>,
    events: mpsc::Sender<ClockEvent>,
    status: watch::Sender<ClockStatusView>,
) {
    let (tick_tx, mut tick_rx) = mpsc::channel::<u64>(1);
    let mut ticker: Option<Ticker> = None;
    let mut generation = 0u64;

    loop {
        let event = tokio::select! {
            control = controls.recv() => {
                let Some(control) = control else {
                    debug!("All clock handles dropped");
                    break;
                };
                debug!(control = ?control, status = ?state.status(), "Clock control received");
                state.apply(control)
            }
            Some(fired) = tick_rx.recv() => {
                // Ticks from a stopped ticker may still be queued
                if ticker.as_ref().map(|t| t.generation) != Some(fired) {
                    continue;
                }
                state.tick()
            }
        };

        match state.status() {
            ClockStatus::Playing if ticker.is_none() => {
                generation += 1;
                ticker = Some(spawn_ticker(tick, generation, tick_tx.clone()));
            }
            ClockStatus::Playing => {}
            _ => ticker = None,
        }
        status.send_replace(state.view());

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                debug!("Clock event stream dropped");
                break;
            }
        }

        if state.status() == ClockStatus::Closed {
            info!("Clock closed");
            break;
        }
    }
}
