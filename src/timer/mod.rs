mod clock;
mod format;

pub use clock::{Clock, SystemClock};
pub use format::{format_elapsed, format_start_time};

#[cfg(test)]
pub use clock::ManualClock;

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use crate::store::Record;

/// Commands issued out of sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("Timer already running.")]
    AlreadyRunning,

    #[error("No timer running.")]
    NotRunning,
}

/// An in-progress timing interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    /// Shifted forward on every resume, so `now - start_time` is always the
    /// time spent running.
    pub start_time: NaiveDateTime,
}

/// Timer state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running(Session),
    Paused {
        session: Session,
        /// Never earlier than `session.start_time`
        paused_at: NaiveDateTime,
    },
}

/// Coarse state used for enabling controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

impl TimerState {
    pub fn phase(&self) -> Phase {
        match self {
            TimerState::Idle => Phase::Idle,
            TimerState::Running(_) => Phase::Running,
            TimerState::Paused { .. } => Phase::Paused,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            TimerState::Idle => None,
            TimerState::Running(session) | TimerState::Paused { session, .. } => Some(session),
        }
    }
}

/// Outcome of the pause/resume toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Paused,
    /// Ticking resumed under a fresh epoch
    Resumed(u64),
}

/// Session timer controller.
///
/// Holds no UI state. Every entry into Running hands out a new tick epoch;
/// leaving Running retires it, so ticks scheduled for an older epoch are
/// ignored even if they are already queued.
pub struct SessionTimer {
    clock: Box<dyn Clock>,
    state: TimerState,
    epoch: u64,
}

impl SessionTimer {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            state: TimerState::Idle,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Start timing `subject`. Returns the tick epoch to schedule.
    pub fn start(&mut self, subject: &str) -> Result<u64, TimerError> {
        if self.state != TimerState::Idle {
            tracing::warn!("start rejected: timer already running");
            return Err(TimerError::AlreadyRunning);
        }

        let session = Session {
            subject: subject.to_string(),
            start_time: self.clock.now(),
        };
        tracing::info!(subject = %session.subject, "timer started");
        self.state = TimerState::Running(session);
        Ok(self.next_epoch())
    }

    /// Pause a running timer, or resume a paused one.
    pub fn pause_or_resume(&mut self) -> Result<Toggle, TimerError> {
        let now = self.clock.now();
        match std::mem::take(&mut self.state) {
            TimerState::Idle => {
                tracing::warn!("pause rejected: no timer running");
                Err(TimerError::NotRunning)
            }
            TimerState::Running(session) => {
                let paused_at = now.max(session.start_time);
                self.retire_epoch();
                tracing::info!(subject = %session.subject, "timer paused");
                self.state = TimerState::Paused { session, paused_at };
                Ok(Toggle::Paused)
            }
            TimerState::Paused {
                mut session,
                paused_at,
            } => {
                let paused_for = (now - paused_at).max(Duration::zero());
                session.start_time += paused_for;
                tracing::info!(
                    subject = %session.subject,
                    paused_secs = paused_for.num_seconds(),
                    "timer resumed"
                );
                self.state = TimerState::Running(session);
                Ok(Toggle::Resumed(self.next_epoch()))
            }
        }
    }

    /// Stop the timer and produce the record of the finished session.
    pub fn stop(&mut self) -> Result<Record, TimerError> {
        let now = self.clock.now();
        let session = match std::mem::take(&mut self.state) {
            TimerState::Idle => {
                tracing::warn!("stop rejected: no timer running");
                return Err(TimerError::NotRunning);
            }
            TimerState::Running(session) | TimerState::Paused { session, .. } => session,
        };
        self.retire_epoch();

        let elapsed = (now - session.start_time).max(Duration::zero());
        tracing::info!(
            subject = %session.subject,
            elapsed_secs = elapsed.num_seconds(),
            "timer stopped"
        );
        Ok(Record {
            subject: session.subject,
            start_time: session.start_time,
            elapsed,
        })
    }

    /// Elapsed running time, if a session exists
    pub fn elapsed(&self) -> Option<Duration> {
        match &self.state {
            TimerState::Idle => None,
            TimerState::Running(session) => {
                Some((self.clock.now() - session.start_time).max(Duration::zero()))
            }
            TimerState::Paused { session, paused_at } => {
                Some(*paused_at - session.start_time)
            }
        }
    }

    /// Handle a tick for `epoch`. Returns the elapsed time to display, or
    /// `None` when the tick is stale or the timer is not running.
    pub fn tick(&self, epoch: u64) -> Option<Duration> {
        if epoch != self.epoch || self.phase() != Phase::Running {
            tracing::debug!(epoch, current = self.epoch, "stale tick ignored");
            return None;
        }
        self.elapsed()
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn retire_epoch(&mut self) {
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (SessionTimer, ManualClock) {
        let clock = ManualClock::new();
        (SessionTimer::new(Box::new(clock.clone())), clock)
    }

    #[test]
    fn test_start_stop_measures_wall_clock() {
        let (mut timer, clock) = timer();
        timer.start("rust").unwrap();
        clock.advance_secs(42);

        let record = timer.stop().unwrap();
        assert_eq!(record.subject, "rust");
        assert_eq!(record.elapsed, Duration::seconds(42));
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn test_paused_interval_is_excluded() {
        let (mut timer, clock) = timer();
        timer.start("reading").unwrap();
        let started = timer.state().session().unwrap().start_time;

        clock.advance_secs(5);
        assert_eq!(timer.pause_or_resume().unwrap(), Toggle::Paused);
        clock.advance_secs(10);
        assert!(matches!(timer.pause_or_resume().unwrap(), Toggle::Resumed(_)));
        clock.advance_secs(5);

        let record = timer.stop().unwrap();
        assert_eq!(record.elapsed, Duration::seconds(10));
        assert_eq!(record.start_time, started + Duration::seconds(10));
    }

    #[test]
    fn test_stop_while_paused_counts_up_to_now() {
        let (mut timer, clock) = timer();
        timer.start("math").unwrap();
        clock.advance_secs(7);
        timer.pause_or_resume().unwrap();
        clock.advance_secs(100);

        // Only a resume shifts the start time, so an open pause is counted.
        let record = timer.stop().unwrap();
        assert_eq!(record.elapsed, Duration::seconds(107));
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (mut timer, clock) = timer();
        timer.start("first").unwrap();
        let before = timer.state().clone();

        clock.advance_secs(3);
        assert_eq!(timer.start("second"), Err(TimerError::AlreadyRunning));
        assert_eq!(timer.state(), &before);

        timer.pause_or_resume().unwrap();
        assert_eq!(timer.start("third"), Err(TimerError::AlreadyRunning));
        assert_eq!(timer.phase(), Phase::Paused);
    }

    #[test]
    fn test_stop_and_pause_while_idle_are_rejected() {
        let (mut timer, _clock) = timer();
        assert_eq!(timer.stop(), Err(TimerError::NotRunning));
        assert_eq!(timer.pause_or_resume(), Err(TimerError::NotRunning));
        assert_eq!(timer.state(), &TimerState::Idle);
    }

    #[test]
    fn test_tick_reports_elapsed_while_running() {
        let (mut timer, clock) = timer();
        let epoch = timer.start("tick").unwrap();
        clock.advance_secs(2);
        assert_eq!(timer.tick(epoch), Some(Duration::seconds(2)));
    }

    #[test]
    fn test_tick_is_ignored_after_pause_and_stop() {
        let (mut timer, clock) = timer();
        let epoch = timer.start("tick").unwrap();
        clock.advance_secs(1);

        timer.pause_or_resume().unwrap();
        assert_eq!(timer.tick(epoch), None);

        let resumed = match timer.pause_or_resume().unwrap() {
            Toggle::Resumed(e) => e,
            Toggle::Paused => panic!("expected resume"),
        };
        assert_ne!(resumed, epoch);
        assert_eq!(timer.tick(epoch), None);
        assert!(timer.tick(resumed).is_some());

        timer.stop().unwrap();
        assert_eq!(timer.tick(resumed), None);
    }

    #[test]
    fn test_clock_going_backwards_never_goes_negative() {
        let (mut timer, clock) = timer();
        timer.start("dst").unwrap();
        clock.advance_secs(-60);
        assert_eq!(timer.elapsed(), Some(Duration::zero()));
        assert_eq!(timer.stop().unwrap().elapsed, Duration::zero());
    }
}
