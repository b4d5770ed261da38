// Track player - one voice's clock, lock state and trig firing

use crate::midi::event::MidiMessage;
use crate::sequencer::clock::{Clock, Deferred, millis, step_period};
use crate::sequencer::lock::LockController;
use crate::sequencer::machine::Voice;
use crate::sequencer::params::ParamMap;
use crate::sequencer::pattern::{Note, Track};
use crate::sequencer::sink::MessageSink;
use crate::sequencer::state::TrackState;
use std::time::Instant;

/// Work a track schedules for later
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    NoteOff { key: u8 },
    /// Lock or preset burst held back until the sounding note is released
    Burst(ParamMap),
    /// Nudged note
    NoteOn(Note),
}

impl Deferred for TrackEvent {
    // Release before re-locking, re-lock before the next note
    fn rank(&self) -> u8 {
        match self {
            TrackEvent::NoteOff { .. } => 0,
            TrackEvent::Burst(_) => 1,
            TrackEvent::NoteOn(_) => 2,
        }
    }
}

/// Plays one track of a pattern
///
/// Each tick runs in two phases: resolve scale and lock transitions, then
/// emit. Lock bursts never interleave with note data of the same step.
#[derive(Debug)]
pub struct TrackPlayer {
    voice: Voice,
    track: Track,
    tempo: f64,
    length: usize,
    factor: f64,
    clock: Clock<TrackEvent>,
    lock: LockController,
    /// Step played by the next tick
    count: usize,
    /// The previous tick switched the clock to a trig scale
    scale_locked: bool,
    /// Latest release instant of a note started by this track
    sounding_until: Option<Instant>,
    /// At least one step played since start
    played: bool,
}

impl TrackPlayer {
    pub fn new(voice: Voice, track: Track, tempo: f64, length: usize, factor: f64) -> Self {
        Self {
            voice,
            track,
            tempo,
            length,
            factor,
            clock: Clock::new(step_period(tempo, factor)),
            lock: LockController::new(),
            count: 0,
            scale_locked: false,
            sounding_until: None,
            played: false,
        }
    }

    pub fn voice(&self) -> Voice {
        self.voice
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Apply step 0's lock or the preset, then start ticking from `now`
    pub fn start(&mut self, now: Instant, sink: &mut dyn MessageSink) {
        self.count = 0;
        self.scale_locked = false;
        self.sounding_until = None;
        self.played = false;

        let first_lock = self.track.trig_at(0).and_then(|t| t.active_lock()).copied();
        let initial = self.lock.start(first_lock.as_ref(), &self.track.preset);
        self.emit_map(now, &initial, sink);

        self.clock.start(now, step_period(self.tempo, self.factor));
    }

    /// Handle the periodic tick for the current step
    pub fn tick(&mut self, now: Instant, sink: &mut dyn MessageSink) {
        let step = self.count;
        let trig = self.track.trig_at(step).copied();
        let next = if step >= self.length { 0 } else { step + 1 };

        // Resolve: interval length, then the lock for the following step
        match trig.and_then(|t| t.scale) {
            Some(factor) => {
                self.clock.reset(step_period(self.tempo, factor));
                self.scale_locked = true;
            }
            None if self.scale_locked => {
                self.clock.reset(step_period(self.tempo, self.factor));
                self.scale_locked = false;
            }
            None => {}
        }
        let next_lock = self.track.trig_at(next).and_then(|t| t.active_lock()).copied();
        let burst = self.lock.advance(next_lock.as_ref(), &self.track.preset);

        // Emit: the note, preceded by any burst still waiting on a release
        if let Some(trig) = trig {
            if trig.nudge_ms > 0.0 {
                let at = now + millis(trig.nudge_ms);
                self.hold_bursts_until(at);
                self.clock.at(at, TrackEvent::NoteOn(trig.note));
                self.extend_sounding(at + millis(trig.note.length_ms));
            } else {
                self.flush_bursts(now, sink);
                self.note_on(now, trig.note, sink);
            }
        }

        if let Some(map) = burst {
            match self.sounding_until {
                Some(until) if until > now => self.clock.at(until, TrackEvent::Burst(map)),
                _ => self.emit_map(now, &map, sink),
            }
        }

        self.count = next;
        self.played = true;
        self.clock.tick(now);
    }

    /// The next tick would start the track over from step 0
    pub fn at_wrap(&self) -> bool {
        self.played && self.count == 0
    }

    /// Fire the earliest one-shot if due; false when nothing was due
    pub fn fire_one_shot(&mut self, now: Instant, sink: &mut dyn MessageSink) -> bool {
        let Some((_, event)) = self.clock.pop_due(now) else {
            return false;
        };
        match event {
            TrackEvent::NoteOff { key } => sink.emit(now, MidiMessage::note_off(self.voice, key)),
            TrackEvent::Burst(map) => self.emit_map(now, &map, sink),
            TrackEvent::NoteOn(note) => self.note_on(now, note, sink),
        }
        true
    }

    pub fn pause(&mut self, now: Instant) {
        self.clock.pause(now);
    }

    pub fn resume(&mut self, now: Instant) {
        self.clock.resume(now);
    }

    /// Stop ticking; queued note-ons and bursts are dropped, note-offs stay
    pub fn halt(&mut self) {
        self.clock.stop();
        self.clock
            .retain_one_shots(|e| matches!(e, TrackEvent::NoteOff { .. }));
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.clock.next_tick()
    }

    pub fn next_one_shot(&self) -> Option<(Instant, u8)> {
        self.clock.next_one_shot()
    }

    /// Halted with every note-off delivered
    pub fn is_idle(&self) -> bool {
        self.clock.is_idle()
    }

    pub fn state(&self) -> TrackState {
        TrackState {
            voice: self.voice,
            step: self.count,
            lock_active: self.lock.is_locked(),
            scale_override_active: self.scale_locked,
        }
    }

    fn note_on(&mut self, now: Instant, note: Note, sink: &mut dyn MessageSink) {
        sink.emit(now, MidiMessage::note_on(self.voice, note.key, note.velocity));
        let off = self
            .clock
            .after(now, millis(note.length_ms), TrackEvent::NoteOff { key: note.key });
        self.extend_sounding(off);
    }

    fn extend_sounding(&mut self, until: Instant) {
        self.sounding_until = Some(self.sounding_until.map_or(until, |t| t.max(until)));
    }

    fn take_bursts(&mut self) -> Vec<(Instant, TrackEvent)> {
        self.clock
            .take_one_shots(|e| matches!(e, TrackEvent::Burst(_)))
    }

    /// Send every waiting burst now, ahead of a note
    fn flush_bursts(&mut self, now: Instant, sink: &mut dyn MessageSink) {
        for (_, event) in self.take_bursts() {
            if let TrackEvent::Burst(map) = event {
                self.emit_map(now, &map, sink);
            }
        }
    }

    /// Pull waiting bursts forward so they fire no later than a nudged note at `at`
    fn hold_bursts_until(&mut self, at: Instant) {
        for (due, event) in self.take_bursts() {
            self.clock.at(due.min(at), event);
        }
    }

    fn emit_map(&self, now: Instant, map: &ParamMap, sink: &mut dyn MessageSink) {
        for message in map.to_messages(self.voice) {
            sink.emit(now, message);
        }
    }
}
