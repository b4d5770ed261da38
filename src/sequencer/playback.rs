// Playback - one session: the chain, the current pattern, and tracks draining their note-offs
//
// Everything here is driven by deadlines. The real-time runner waits for the
// next deadline on the control channel; `advance_to` steps the same logic in
// virtual time for offline rendering and tests.

use crate::error::{SequencerError, SequencerResult};
use crate::messaging::{NotificationCategory, Reporter};
use crate::sequencer::bank::PatternBank;
use crate::sequencer::chain::ChainScheduler;
use crate::sequencer::pattern::PatternId;
use crate::sequencer::pattern_player::PatternPlayer;
use crate::sequencer::sink::{GatedOutput, MessageSink};
use crate::sequencer::state::{PlaybackState, PlaybackStatus};
use crate::sequencer::track_player::TrackPlayer;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Commands from the control plane to a playback thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Draining(usize),
    Current(usize),
}

/// Next unit of work. Variant order breaks deadline ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    OneShot { rank: u8, slot: Slot },
    Conductor,
    Tick(usize),
}

/// A playback session
pub struct Playback {
    bank: Arc<PatternBank>,
    chain: ChainScheduler,
    current: Option<PatternPlayer>,
    /// Halted tracks still owing note-offs
    draining: Vec<TrackPlayer>,
    status: PlaybackStatus,
    reporter: Option<Reporter>,
}

impl Playback {
    /// Session over `chain`; every id must be in `bank`
    pub fn new(bank: Arc<PatternBank>, chain: Vec<PatternId>) -> SequencerResult<Self> {
        let chain = ChainScheduler::new(chain)?;
        if let Some(missing) = chain.patterns().iter().find(|id| !bank.contains(**id)) {
            return Err(SequencerError::NotFound(*missing));
        }

        Ok(Self {
            bank,
            chain,
            current: None,
            draining: Vec::new(),
            status: PlaybackStatus::Stopped,
            reporter: None,
        })
    }

    /// Send handoff notices through `reporter`
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Start the first pattern of the chain at `now`
    pub fn start(&mut self, now: Instant, sink: &mut dyn MessageSink) {
        self.status = PlaybackStatus::Playing;
        self.launch(self.chain.current(), now, sink);
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        if let Some(current) = &mut self.current {
            current.pause(now);
        }
        self.status = PlaybackStatus::Paused;
        log::debug!(target: "Playback", "paused");
        true
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        if self.status != PlaybackStatus::Paused {
            return false;
        }
        if let Some(current) = &mut self.current {
            current.resume(now);
        }
        self.status = PlaybackStatus::Playing;
        log::debug!(target: "Playback", "resumed");
        true
    }

    /// Terminal: ticks end, queued note-offs still fire
    pub fn stop(&mut self) {
        if let Some(current) = self.current.take() {
            log::debug!(target: "Playback", "stopping pattern {}", current.id());
            self.draining.extend(current.halt());
        }
        self.status = PlaybackStatus::Stopped;
    }

    /// Stopped with every note-off delivered
    pub fn is_finished(&self) -> bool {
        self.status == PlaybackStatus::Stopped
            && self.current.is_none()
            && self.draining.iter().all(TrackPlayer::is_idle)
    }

    pub fn current_pattern(&self) -> Option<PatternId> {
        self.current.as_ref().map(PatternPlayer::id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due().map(|(at, _)| at)
    }

    /// Handle everything due at or before `now`, stamping output with `now`
    ///
    /// Returns the number of events handled.
    pub fn process_due(&mut self, now: Instant, sink: &mut dyn MessageSink) -> usize {
        let mut handled = 0;
        while let Some((at, due)) = self.next_due() {
            if at > now {
                break;
            }
            self.handle(due, now, sink);
            handled += 1;
        }
        self.draining.retain(|t| !t.is_idle());
        handled
    }

    /// Step in virtual time up to `target`, each event at its exact deadline
    pub fn advance_to(&mut self, target: Instant, sink: &mut dyn MessageSink) -> usize {
        let mut handled = 0;
        while let Some(at) = self.next_deadline() {
            if at > target {
                break;
            }
            handled += self.process_due(at, sink);
        }
        handled
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            status: self.status,
            pattern: self.current_pattern(),
            chain_index: self.chain.index(),
            changing: self.chain.is_changing(),
            change_countdown: self.chain.countdown(),
            tracks: self
                .current
                .as_ref()
                .map(PatternPlayer::track_states)
                .unwrap_or_default(),
        }
    }

    fn next_due(&self) -> Option<(Instant, Due)> {
        let mut best: Option<(Instant, Due)> = None;
        let mut consider = |at: Instant, due: Due| {
            if best.is_none_or(|b| (at, due) < b) {
                best = Some((at, due));
            }
        };

        for (i, track) in self.draining.iter().enumerate() {
            if let Some((at, rank)) = track.next_one_shot() {
                consider(at, Due::OneShot { rank, slot: Slot::Draining(i) });
            }
        }
        if let Some(current) = &self.current {
            for (i, track) in current.tracks().iter().enumerate() {
                if let Some((at, rank)) = track.next_one_shot() {
                    consider(at, Due::OneShot { rank, slot: Slot::Current(i) });
                }
                if let Some(at) = track.next_tick() {
                    consider(at, Due::Tick(i));
                }
            }
            if let Some(at) = current.next_conductor_tick() {
                consider(at, Due::Conductor);
            }
        }
        best
    }

    fn handle(&mut self, due: Due, now: Instant, sink: &mut dyn MessageSink) {
        match due {
            Due::OneShot { slot: Slot::Draining(i), .. } => {
                if let Some(track) = self.draining.get_mut(i) {
                    track.fire_one_shot(now, sink);
                }
            }
            Due::OneShot { slot: Slot::Current(i), .. } => {
                if let Some(track) = self.current.as_mut().and_then(|c| c.tracks_mut().get_mut(i)) {
                    track.fire_one_shot(now, sink);
                }
            }
            Due::Tick(i) => {
                // A leading track's wrap ends the pattern before step 0 replays
                let next = self.current.as_ref().and_then(|current| {
                    let ended = current.ends_at_tick(i)?;
                    self.chain.on_conductor_tick(ended, current.change_bars())
                });
                if let Some(next) = next {
                    self.handoff(next, now, sink);
                } else if let Some(track) =
                    self.current.as_mut().and_then(|c| c.tracks_mut().get_mut(i))
                {
                    track.tick(now, sink);
                }
            }
            Due::Conductor => {
                let Some(current) = self.current.as_mut() else {
                    return;
                };
                let ended = current.conductor_tick(now);
                let change_bars = current.change_bars();
                if let Some(next) = self.chain.on_conductor_tick(ended, change_bars) {
                    self.handoff(next, now, sink);
                }
            }
        }
    }

    fn handoff(&mut self, next: PatternId, now: Instant, sink: &mut dyn MessageSink) {
        if let Some(old) = self.current.take() {
            let from = old.id();
            self.draining.extend(old.halt());
            if let Some(reporter) = &self.reporter {
                reporter.info(
                    NotificationCategory::Playback,
                    format!("pattern {} -> {} (chain index {})", from, next, self.chain.index()),
                );
            }
        }
        self.launch(next, now, sink);
    }

    fn launch(&mut self, id: PatternId, now: Instant, sink: &mut dyn MessageSink) {
        match self.bank.get(id) {
            Some(pattern) => {
                log::debug!(target: "Playback", "starting pattern {} ({} tracks)", id, pattern.track_count());
                let mut player = PatternPlayer::new(id, pattern);
                player.start(now, sink);
                self.current = Some(player);
            }
            None => {
                // Ids are checked in `new`; only reachable with a bank that changed underneath
                log::error!(target: "Playback", "pattern {} missing from bank", id);
                self.status = PlaybackStatus::Stopped;
            }
        }
    }
}

/// Margin before a deadline where the runner stops blocking and spins
const SPIN_MARGIN: Duration = Duration::from_millis(2);

/// Run a session on its own thread until it is stopped and drained
pub(crate) fn spawn_runner(
    mut playback: Playback,
    mut sink: GatedOutput,
    control_rx: Receiver<Control>,
    shared: Arc<Mutex<PlaybackState>>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("modelseq-playback".to_string())
        .spawn(move || {
            playback.start(Instant::now(), &mut sink);

            loop {
                playback.process_due(Instant::now(), &mut sink);
                if let Ok(mut state) = shared.lock() {
                    *state = playback.state();
                }
                if playback.is_finished() {
                    break;
                }

                let control = match playback.next_deadline() {
                    Some(deadline) => wait_until(&control_rx, deadline),
                    None => Some(control_rx.recv().unwrap_or(Control::Stop)),
                };

                match control {
                    Some(Control::Pause) => {
                        playback.pause(Instant::now());
                    }
                    Some(Control::Resume) => {
                        playback.resume(Instant::now());
                    }
                    Some(Control::Stop) => playback.stop(),
                    None => {}
                }
            }

            log::debug!(
                target: "Playback",
                "session finished ({} failed sends)",
                sink.failures()
            );
        })
}

/// Block on the control channel until shortly before `deadline`, then spin
///
/// A dropped control plane counts as `Stop`.
fn wait_until(control_rx: &Receiver<Control>, deadline: Instant) -> Option<Control> {
    let coarse = deadline.checked_sub(SPIN_MARGIN).unwrap_or(deadline);
    let received = if coarse > Instant::now() {
        match control_rx.recv_deadline(coarse) {
            Ok(control) => return Some(control),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Control::Stop),
        }
    } else {
        match control_rx.try_recv() {
            Ok(control) => return Some(control),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Control::Stop),
        }
    };

    spin_sleep::sleep(deadline.saturating_duration_since(Instant::now()));
    received
}
