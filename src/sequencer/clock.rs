// Clock - per-track step timer with drift-corrected ticks and one-shot timers
//
// The clock never sleeps itself. It only tracks deadlines; the playback thread
// asks for the next one, waits, then reports the tick back with `tick(now)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// Scheduler sub-steps per authored beat
pub const SUBSTEPS_PER_BEAT: f64 = 2.0;

/// Step period in milliseconds for a tempo and scale factor
#[inline]
pub fn step_period_ms(tempo: f64, factor: f64) -> f64 {
    60_000.0 / (tempo * SUBSTEPS_PER_BEAT * factor)
}

/// Shortest period a clock will run at
pub const MIN_STEP_PERIOD: Duration = Duration::from_micros(500);

/// Step period as a `Duration`, never below `MIN_STEP_PERIOD`
#[inline]
pub fn step_period(tempo: f64, factor: f64) -> Duration {
    millis(step_period_ms(tempo, factor)).max(MIN_STEP_PERIOD)
}

/// Longest delay a clock schedules: one hour
pub const MAX_DELAY_MS: f64 = 3_600_000.0;

/// Milliseconds as a `Duration`, clamped to `0..=MAX_DELAY_MS`
///
/// NaN becomes zero.
#[inline]
pub fn millis(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms.min(MAX_DELAY_MS) / 1000.0).unwrap_or(Duration::ZERO)
}

/// Item queued on a clock's one-shot timer
///
/// Lower ranks fire first when two one-shots share a deadline.
pub trait Deferred {
    fn rank(&self) -> u8;
}

/// Clocks without one-shots
impl Deferred for std::convert::Infallible {
    fn rank(&self) -> u8 {
        match *self {}
    }
}

#[derive(Debug)]
struct Scheduled<T> {
    at: Instant,
    rank: u8,
    seq: u64,
    item: T,
}

impl<T> Scheduled<T> {
    fn key(&self) -> (Instant, u8, u64) {
        (self.at, self.rank, self.seq)
    }
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    // Reversed so the BinaryHeap pops the earliest entry
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockState {
    Stopped,
    Running { next: Instant },
    Paused { remaining: Duration },
}

/// Periodic tick source plus a queue of one-shot timers
#[derive(Debug)]
pub struct Clock<T> {
    period: Duration,
    state: ClockState,
    last_tick: Option<Instant>,
    one_shots: BinaryHeap<Scheduled<T>>,
    seq: u64,
}

impl<T: Deferred> Clock<T> {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: ClockState::Stopped,
            last_tick: None,
            one_shots: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Start ticking; the first tick is due at `now`
    pub fn start(&mut self, now: Instant, period: Duration) {
        self.period = period;
        self.last_tick = None;
        self.state = ClockState::Running { next: now };
    }

    /// Record a tick handled at `now` and schedule the next one from it
    pub fn tick(&mut self, now: Instant) {
        if let ClockState::Running { .. } = self.state {
            self.last_tick = Some(now);
            self.state = ClockState::Running {
                next: now + self.period,
            };
        }
    }

    /// Change the period of the interval following the last tick
    pub fn reset(&mut self, period: Duration) {
        self.period = period;
        if let (ClockState::Running { .. }, Some(last)) = (self.state, self.last_tick) {
            self.state = ClockState::Running {
                next: last + period,
            };
        }
    }

    /// Halt periodic ticks. One-shots stay queued.
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
    }

    /// Freeze the periodic tick, remembering the time left until it
    pub fn pause(&mut self, now: Instant) -> bool {
        match self.state {
            ClockState::Running { next } => {
                self.state = ClockState::Paused {
                    remaining: next.saturating_duration_since(now),
                };
                true
            }
            _ => false,
        }
    }

    /// Continue after a pause with the same period and remaining time
    pub fn resume(&mut self, now: Instant) -> bool {
        match self.state {
            ClockState::Paused { remaining } => {
                let next = now + remaining;
                // Keep `reset` relative to the tick that would have preceded `next`
                self.last_tick = next.checked_sub(self.period);
                self.state = ClockState::Running { next };
                true
            }
            _ => false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, ClockState::Paused { .. })
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ClockState::Stopped
    }

    /// Deadline of the next periodic tick
    pub fn next_tick(&self) -> Option<Instant> {
        match self.state {
            ClockState::Running { next } => Some(next),
            _ => None,
        }
    }

    /// Queue `item` to fire `delay` after `now`, returning its deadline
    pub fn after(&mut self, now: Instant, delay: Duration, item: T) -> Instant {
        let at = now + delay;
        self.at(at, item);
        at
    }

    /// Queue `item` at an absolute deadline
    pub fn at(&mut self, at: Instant, item: T) {
        self.seq += 1;
        self.one_shots.push(Scheduled {
            at,
            rank: item.rank(),
            seq: self.seq,
            item,
        });
    }

    /// Deadline and rank of the earliest one-shot
    pub fn next_one_shot(&self) -> Option<(Instant, u8)> {
        self.one_shots.peek().map(|s| (s.at, s.rank))
    }

    /// Remove the earliest one-shot if it is due at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, T)> {
        if self.one_shots.peek().is_some_and(|s| s.at <= now) {
            self.one_shots.pop().map(|s| (s.at, s.item))
        } else {
            None
        }
    }

    /// Drop queued one-shots that do not satisfy `keep`
    pub fn retain_one_shots(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let pending = std::mem::take(&mut self.one_shots);
        self.one_shots = pending.into_iter().filter(|s| keep(&s.item)).collect();
    }

    /// Remove the one-shots matching `take`, in firing order, with their deadlines
    pub fn take_one_shots(&mut self, mut take: impl FnMut(&T) -> bool) -> Vec<(Instant, T)> {
        let mut pending = std::mem::take(&mut self.one_shots).into_vec();
        pending.sort_by_key(|s| s.key());
        let (taken, kept): (Vec<_>, Vec<_>) = pending.into_iter().partition(|s| take(&s.item));
        self.one_shots = kept.into_iter().collect();
        taken.into_iter().map(|s| (s.at, s.item)).collect()
    }

    pub fn pending_one_shots(&self) -> usize {
        self.one_shots.len()
    }

    /// True once periodic ticks are over and nothing is queued
    pub fn is_idle(&self) -> bool {
        self.is_stopped() && self.one_shots.is_empty()
    }
}
