//! Mode scheduler - decides when rows are injected
//!
//! Classic mode injects after every successful clear and has no clock.
//! Timed mode runs a repeating `RowTimer`: each expiry injects a row and
//! restarts the full period, and each clear also restarts the full period.
//!
//! The timer stores a deadline rather than counting ticks, so remaining time
//! never drifts with the caller's tick rate. Pausing freezes the remaining
//! duration and resuming derives a new deadline from it.

use std::time::{Duration, Instant};

use crate::types::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    /// No pending fire.
    Stopped,
    Running { deadline: Instant },
    Suspended { remaining: Duration },
}

/// Cancellable repeating countdown.
#[derive(Debug, Clone)]
pub struct RowTimer {
    period: Duration,
    state: TimerState,
}

impl RowTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: TimerState::Stopped,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a full period from `now`, replacing any previous state.
    pub fn start(&mut self, now: Instant) {
        self.state = TimerState::Running {
            deadline: now + self.period,
        };
    }

    /// Restart the full period. A stopped timer stays stopped.
    pub fn reset(&mut self, now: Instant) {
        match self.state {
            TimerState::Running { .. } => self.start(now),
            TimerState::Suspended { .. } => {
                self.state = TimerState::Suspended {
                    remaining: self.period,
                }
            }
            TimerState::Stopped => {}
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let TimerState::Running { deadline } = self.state {
            self.state = TimerState::Suspended {
                remaining: deadline.saturating_duration_since(now),
            };
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let TimerState::Suspended { remaining } = self.state {
            self.state = TimerState::Running {
                deadline: now + remaining,
            };
        }
    }

    pub fn cancel(&mut self) {
        self.state = TimerState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Time left in the current period; `None` when stopped.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            TimerState::Running { deadline } => Some(deadline.saturating_duration_since(now)),
            TimerState::Suspended { remaining } => Some(remaining),
            TimerState::Stopped => None,
        }
    }

    /// Fire if the deadline has passed. A fire restarts the full period from `now`;
    /// at most one fire is reported per call.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            TimerState::Running { deadline } if now >= deadline => {
                self.start(now);
                true
            }
            _ => false,
        }
    }
}

/// Per-mode injection policy.
#[derive(Debug, Clone)]
pub struct ModeScheduler {
    mode: Mode,
    timer: Option<RowTimer>,
}

impl ModeScheduler {
    pub fn new(mode: Mode, period: Duration) -> Self {
        let timer = match mode {
            Mode::Classic => None,
            Mode::Timed => Some(RowTimer::new(period)),
        };
        Self { mode, timer }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Session entered Active for the first time.
    pub fn start(&mut self, now: Instant) {
        if let Some(timer) = self.timer.as_mut() {
            timer.start(now);
        }
    }

    /// A clear happened. Returns true if a row must be injected right away.
    pub fn on_clear(&mut self, now: Instant) -> bool {
        match self.timer.as_mut() {
            None => true,
            Some(timer) => {
                timer.reset(now);
                false
            }
        }
    }

    /// Advance the clock. Returns true if the timer fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.timer.as_mut().map(|t| t.poll(now)).unwrap_or(false)
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(timer) = self.timer.as_mut() {
            timer.pause(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(timer) = self.timer.as_mut() {
            timer.resume(now);
        }
    }

    /// Session left Active for good.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.timer.as_ref().and_then(|t| t.remaining(now))
    }

    pub fn period(&self) -> Option<Duration> {
        self.timer.as_ref().map(|t| t.period())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(15_000);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn timer_counts_down_from_deadline() {
        let t0 = Instant::now();
        let mut timer = RowTimer::new(PERIOD);
        assert_eq!(timer.remaining(t0), None);

        timer.start(t0);
        assert_eq!(timer.remaining(t0), Some(PERIOD));
        assert_eq!(timer.remaining(t0 + ms(1_000)), Some(ms(14_000)));
        assert!(!timer.poll(t0 + ms(14_999)));
        assert!(timer.poll(t0 + ms(15_000)));
        assert_eq!(timer.remaining(t0 + ms(15_000)), Some(PERIOD));
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let t0 = Instant::now();
        let mut timer = RowTimer::new(PERIOD);
        timer.start(t0);

        timer.pause(t0 + ms(4_000));
        assert_eq!(timer.remaining(t0 + ms(60_000)), Some(ms(11_000)));
        assert!(!timer.poll(t0 + ms(60_000)));

        timer.resume(t0 + ms(60_000));
        assert_eq!(timer.remaining(t0 + ms(60_000)), Some(ms(11_000)));
        assert!(timer.poll(t0 + ms(71_000)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let t0 = Instant::now();
        let mut timer = RowTimer::new(PERIOD);
        timer.start(t0);
        timer.cancel();
        assert!(!timer.poll(t0 + ms(100_000)));
        assert!(!timer.is_running());
    }

    #[test]
    fn reset_restores_full_period() {
        let t0 = Instant::now();
        let mut timer = RowTimer::new(PERIOD);
        timer.start(t0);
        timer.reset(t0 + ms(9_000));
        assert_eq!(timer.remaining(t0 + ms(9_000)), Some(PERIOD));
    }

    #[test]
    fn classic_injects_on_every_clear() {
        let t0 = Instant::now();
        let mut sched = ModeScheduler::new(Mode::Classic, PERIOD);
        sched.start(t0);
        assert!(sched.on_clear(t0));
        assert!(!sched.poll(t0 + ms(1_000_000)));
        assert_eq!(sched.remaining(t0), None);
    }

    #[test]
    fn timed_clear_resets_instead_of_injecting() {
        let t0 = Instant::now();
        let mut sched = ModeScheduler::new(Mode::Timed, PERIOD);
        sched.start(t0);
        assert!(!sched.on_clear(t0 + ms(10_000)));
        assert!(!sched.poll(t0 + ms(15_000)));
        assert!(sched.poll(t0 + ms(25_000)));
    }
}
