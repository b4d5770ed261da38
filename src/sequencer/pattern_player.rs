// Pattern player - runs every populated track of a pattern plus the pattern-level conductor

use crate::sequencer::clock::{Clock, step_period};
use crate::sequencer::pattern::{Pattern, PatternId, ScaleMode};
use crate::sequencer::sink::MessageSink;
use crate::sequencer::state::TrackState;
use crate::sequencer::track_player::TrackPlayer;
use std::convert::Infallible;
use std::time::Instant;

/// Plays one pattern
///
/// End-of-pattern comes from one of two places. In `PatternWide` mode the
/// first track leads: the pattern ends on the tick where that track wraps, so
/// trig scale overrides stretch or shrink the pattern along with it. In
/// `PerTrack` mode, and for patterns without tracks, a conductor clock counts
/// steps at the pattern scale and reports the end on the tick where its
/// counter would pass `length`. Empty patterns therefore work as rests.
#[derive(Debug)]
pub struct PatternPlayer {
    id: PatternId,
    tempo: f64,
    length: usize,
    factor: f64,
    change_bars: u32,
    /// Track whose wrap ends the pattern
    lead: Option<usize>,
    conductor: Clock<Infallible>,
    conductor_count: usize,
    tracks: Vec<TrackPlayer>,
}

impl PatternPlayer {
    /// One track player per populated track, in voice order
    pub fn new(id: PatternId, pattern: &Pattern) -> Self {
        let tracks = pattern
            .tracks()
            .map(|(voice, track)| {
                let (length, factor) = pattern.effective_scale(voice);
                TrackPlayer::new(voice, track.clone(), pattern.tempo, length, factor)
            })
            .collect::<Vec<_>>();
        let lead = match pattern.scale.mode {
            ScaleMode::PatternWide if !tracks.is_empty() => Some(0),
            _ => None,
        };

        Self {
            id,
            tempo: pattern.tempo,
            length: pattern.scale.length,
            factor: pattern.scale.factor,
            change_bars: pattern.scale.change_bars,
            lead,
            conductor: Clock::new(step_period(pattern.tempo, pattern.scale.factor)),
            conductor_count: 0,
            tracks,
        }
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    pub fn change_bars(&self) -> u32 {
        self.change_bars
    }

    /// Index of the track that ends the pattern, if one does
    pub fn lead(&self) -> Option<usize> {
        self.lead
    }

    /// Start every track, and the conductor when no track leads, on the same epoch
    pub fn start(&mut self, now: Instant, sink: &mut dyn MessageSink) {
        for track in &mut self.tracks {
            track.start(now, sink);
        }
        self.conductor_count = 0;
        if self.lead.is_none() {
            self.conductor.start(now, step_period(self.tempo, self.factor));
        }
    }

    /// True when track `index` leads and its next tick ends the pattern
    pub fn ends_at_tick(&self, index: usize) -> Option<bool> {
        if self.lead != Some(index) {
            return None;
        }
        self.tracks.get(index).map(TrackPlayer::at_wrap)
    }

    /// Advance the conductor; true when the pattern just ended
    pub fn conductor_tick(&mut self, now: Instant) -> bool {
        let ended = self.conductor_count > self.length;
        if ended {
            self.conductor_count = 0;
        }
        self.conductor_count += 1;
        self.conductor.tick(now);
        ended
    }

    pub fn next_conductor_tick(&self) -> Option<Instant> {
        self.conductor.next_tick()
    }

    pub fn pause(&mut self, now: Instant) {
        self.conductor.pause(now);
        for track in &mut self.tracks {
            track.pause(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        self.conductor.resume(now);
        for track in &mut self.tracks {
            track.resume(now);
        }
    }

    /// Halt every track and hand them back so their note-offs can drain
    pub fn halt(mut self) -> Vec<TrackPlayer> {
        self.conductor.stop();
        for track in &mut self.tracks {
            track.halt();
        }
        self.tracks
    }

    pub fn tracks(&self) -> &[TrackPlayer] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [TrackPlayer] {
        &mut self.tracks
    }

    pub fn track_states(&self) -> Vec<TrackState> {
        self.tracks.iter().map(TrackPlayer::state).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::machine::Voice;
    use std::time::Duration;

    #[test]
    fn test_one_player_per_populated_track() {
        let mut pattern = Pattern::default();
        pattern.track(Voice::T4);
        pattern.track(Voice::T1);
        let player = PatternPlayer::new(0, &pattern);
        let voices: Vec<Voice> = player.tracks().iter().map(|t| t.voice()).collect();
        assert_eq!(voices, vec![Voice::T1, Voice::T4]);
    }

    #[test]
    fn test_per_track_lengths() {
        let mut pattern = Pattern::default();
        pattern.scale(ScaleMode::PerTrack, 15, 1.0, 0).unwrap();
        pattern.track(Voice::T1).scale(7, 2.0).unwrap();
        pattern.track(Voice::T2);
        let player = PatternPlayer::new(0, &pattern);
        assert_eq!(player.tracks()[0].length(), 7);
        assert_eq!(player.tracks()[1].length(), 15);
    }

    #[test]
    fn test_conductor_end_of_pattern() {
        let mut pattern = Pattern::default();
        pattern.scale(ScaleMode::PatternWide, 3, 1.0, 0).unwrap();
        let mut player = PatternPlayer::new(0, &pattern);

        let t0 = Instant::now();
        let mut out: Vec<(Instant, crate::midi::MidiMessage)> = Vec::new();
        player.start(t0, &mut out);
        assert!(out.is_empty());

        // Four steps play, the fifth tick is where the pattern ends
        let mut ends = Vec::new();
        for i in 0..10u32 {
            let at = player.next_conductor_tick().unwrap();
            assert_eq!(at, t0 + Duration::from_millis(250) * i);
            ends.push(player.conductor_tick(at));
        }
        assert_eq!(
            ends,
            vec![false, false, false, false, true, false, false, false, true, false]
        );
    }

    #[test]
    fn test_first_track_leads_pattern_wide() {
        let mut pattern = Pattern::default();
        pattern.scale(ScaleMode::PatternWide, 3, 1.0, 0).unwrap();
        pattern.track(Voice::T3).trig(1).unwrap().scale(2.0).unwrap();
        pattern.track(Voice::T5);
        let mut player = PatternPlayer::new(0, &pattern);
        assert_eq!(player.lead(), Some(0));
        assert_eq!(player.ends_at_tick(1), None);

        let t0 = Instant::now();
        let mut out: Vec<(Instant, crate::midi::MidiMessage)> = Vec::new();
        player.start(t0, &mut out);
        assert!(player.next_conductor_tick().is_none());

        // Four steps at 250/125/250/250ms, then the wrap
        let mut ends = Vec::new();
        for _ in 0..5 {
            let at = player.tracks()[0].next_tick().unwrap();
            ends.push(((at - t0).as_millis(), player.ends_at_tick(0)));
            player.tracks_mut()[0].tick(at, &mut out);
        }
        assert_eq!(
            ends,
            vec![
                (0, Some(false)),
                (250, Some(false)),
                (375, Some(false)),
                (625, Some(false)),
                (875, Some(true)),
            ]
        );
    }

    #[test]
    fn test_per_track_mode_keeps_conductor() {
        let mut pattern = Pattern::default();
        pattern.scale(ScaleMode::PerTrack, 15, 1.0, 0).unwrap();
        pattern.track(Voice::T1).scale(3, 2.0).unwrap();
        let mut player = PatternPlayer::new(0, &pattern);
        assert_eq!(player.lead(), None);

        let t0 = Instant::now();
        let mut out: Vec<(Instant, crate::midi::MidiMessage)> = Vec::new();
        player.start(t0, &mut out);
        assert_eq!(player.next_conductor_tick(), Some(t0));
        assert_eq!(player.ends_at_tick(0), None);
    }

    #[test]
    fn test_halt_returns_tracks() {
        let mut pattern = Pattern::default();
        pattern.track(Voice::T2);
        let mut player = PatternPlayer::new(0, &pattern);
        let mut out: Vec<(Instant, crate::midi::MidiMessage)> = Vec::new();
        player.start(Instant::now(), &mut out);

        let tracks = player.halt();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].next_tick().is_none());
    }
}
