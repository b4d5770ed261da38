// Pattern - tracks, trigs and scale settings authored by the caller
// The scheduler only ever reads these; all mutation goes through the authoring methods below

use crate::error::{SequencerError, SequencerResult};
use crate::midi::event::MAX_DATA;
use crate::sequencer::clock::MAX_DELAY_MS;
use crate::sequencer::keys;
use crate::sequencer::machine::Voice;
use crate::sequencer::params::{ParamMap, Parameter};
use std::collections::BTreeMap;

/// Unique identifier for patterns
pub type PatternId = u32;

/// Highest step index a track can hold (128 steps)
pub const MAX_STEP_INDEX: usize = 127;

/// Accepted tempo range
pub const MIN_TEMPO: f64 = 1.0;
pub const MAX_TEMPO: f64 = 1000.0;

/// Accepted scale factor range
pub const MIN_SCALE_FACTOR: f64 = 1.0 / 64.0;
pub const MAX_SCALE_FACTOR: f64 = 64.0;

/// Whether the pattern scale applies to every track or each track keeps its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    PatternWide,
    PerTrack,
}

/// Step resolution of a pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub mode: ScaleMode,
    /// Last step index; the pattern plays `length + 1` steps
    pub length: usize,
    /// Time-division multiplier applied to the step period
    pub factor: f64,
    /// Steps to keep playing after the pattern ends before a chain hands off
    ///
    /// Defaults to 0, so a chain moves on as soon as the pattern ends. The
    /// instrument's own default of 15 would play most of a second pass first.
    pub change_bars: u32,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            mode: ScaleMode::PatternWide,
            length: 15,
            factor: 1.0,
            change_bars: 0,
        }
    }
}

/// Scale a track uses when the pattern is in `PerTrack` mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackScale {
    pub length: usize,
    pub factor: f64,
}

/// Note data fired by a trig
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub key: u8,
    pub length_ms: f64,
    pub velocity: u8,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            key: keys::C4,
            length_ms: 200.0,
            velocity: 110,
        }
    }
}

/// One programmed step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trig {
    pub note: Note,
    /// Parameter override held while this step is current
    pub lock: Option<ParamMap>,
    /// Scale factor used for the interval that follows this step
    pub scale: Option<f64>,
    /// Delay before the note fires, in milliseconds
    pub nudge_ms: f64,
}

impl Trig {
    /// Set key, length (ms) and velocity
    pub fn note(&mut self, key: u8, length_ms: f64, velocity: u8) -> SequencerResult<&mut Self> {
        check_data("key", key)?;
        check_data("velocity", velocity)?;
        check_ms("note length", length_ms)?;
        self.note = Note {
            key,
            length_ms,
            velocity,
        };
        Ok(self)
    }

    /// Trig lock: parameters applied when this step comes up, reverted afterwards
    pub fn lock(&mut self, lock: ParamMap) -> &mut Self {
        self.lock = Some(lock);
        self
    }

    /// Per-trig scale factor
    pub fn scale(&mut self, factor: f64) -> SequencerResult<&mut Self> {
        check_factor(factor)?;
        self.scale = Some(factor);
        Ok(self)
    }

    /// Micro-timing delay in milliseconds
    pub fn nudge(&mut self, nudge_ms: f64) -> SequencerResult<&mut Self> {
        check_ms("nudge", nudge_ms)?;
        self.nudge_ms = nudge_ms;
        Ok(self)
    }

    /// The lock map if it has at least one parameter
    pub fn active_lock(&self) -> Option<&ParamMap> {
        self.lock.as_ref().filter(|l| !l.is_empty())
    }
}

/// One voice's step grid
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    /// Resting parameter state, re-applied when a lock expires
    pub preset: ParamMap,
    pub scale: Option<TrackScale>,
    trigs: BTreeMap<usize, Trig>,
}

impl Track {
    /// Track scale, used when the pattern is in `PerTrack` mode
    pub fn scale(&mut self, length: usize, factor: f64) -> SequencerResult<&mut Self> {
        check_length(length)?;
        check_factor(factor)?;
        self.scale = Some(TrackScale { length, factor });
        Ok(self)
    }

    pub fn preset(&mut self, preset: ParamMap) -> &mut Self {
        self.preset = preset;
        self
    }

    /// Set a single preset parameter
    pub fn parameter(&mut self, parameter: Parameter, value: u8) -> SequencerResult<&mut Self> {
        check_data("parameter value", value)?;
        self.preset.insert(parameter, value);
        Ok(self)
    }

    /// Trig at `step`, created with default note data on first use
    pub fn trig(&mut self, step: usize) -> SequencerResult<&mut Trig> {
        if step > MAX_STEP_INDEX {
            return Err(SequencerError::Configuration(format!(
                "step {} is beyond the last step index {}",
                step, MAX_STEP_INDEX
            )));
        }
        Ok(self.trigs.entry(step).or_default())
    }

    pub fn remove_trig(&mut self, step: usize) -> Option<Trig> {
        self.trigs.remove(&step)
    }

    pub fn trig_at(&self, step: usize) -> Option<&Trig> {
        self.trigs.get(&step)
    }

    /// Trigs in step order
    pub fn trigs(&self) -> impl Iterator<Item = (usize, &Trig)> {
        self.trigs.iter().map(|(s, t)| (*s, t))
    }

    pub fn trig_count(&self) -> usize {
        self.trigs.len()
    }

    pub fn last_step(&self) -> Option<usize> {
        self.trigs.keys().next_back().copied()
    }
}

/// A pattern: tempo, scale and up to six tracks
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub scale: Scale,
    /// Authored tempo; one beat spans two scheduler steps
    pub tempo: f64,
    tracks: BTreeMap<Voice, Track>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            tempo: 120.0,
            tracks: BTreeMap::new(),
        }
    }
}

impl Pattern {
    /// Set the pattern scale
    ///
    /// In `PerTrack` mode these values are the fallback for tracks without
    /// their own scale and drive end-of-pattern detection.
    pub fn scale(
        &mut self,
        mode: ScaleMode,
        length: usize,
        factor: f64,
        change_bars: u32,
    ) -> SequencerResult<&mut Self> {
        check_length(length)?;
        check_factor(factor)?;
        self.scale = Scale {
            mode,
            length,
            factor,
            change_bars,
        };
        Ok(self)
    }

    pub fn tempo(&mut self, tempo: f64) -> SequencerResult<&mut Self> {
        if !(MIN_TEMPO..=MAX_TEMPO).contains(&tempo) {
            return Err(SequencerError::Configuration(format!(
                "tempo must be {}-{}, got {}",
                MIN_TEMPO, MAX_TEMPO, tempo
            )));
        }
        self.tempo = tempo;
        Ok(self)
    }

    /// Track for `voice`, created on first use
    pub fn track(&mut self, voice: Voice) -> &mut Track {
        self.tracks.entry(voice).or_default()
    }

    pub fn track_ref(&self, voice: Voice) -> Option<&Track> {
        self.tracks.get(&voice)
    }

    pub fn remove_track(&mut self, voice: Voice) -> Option<Track> {
        self.tracks.remove(&voice)
    }

    /// Populated tracks in voice order
    pub fn tracks(&self) -> impl Iterator<Item = (Voice, &Track)> {
        self.tracks.iter().map(|(v, t)| (*v, t))
    }

    pub(crate) fn tracks_mut(&mut self) -> impl Iterator<Item = (&Voice, &mut Track)> {
        self.tracks.iter_mut()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// `(length, factor)` a track plays with when the pattern starts
    pub fn effective_scale(&self, voice: Voice) -> (usize, f64) {
        match self.scale.mode {
            ScaleMode::PatternWide => (self.scale.length, self.scale.factor),
            ScaleMode::PerTrack => self
                .tracks
                .get(&voice)
                .and_then(|t| t.scale)
                .map(|s| (s.length, s.factor))
                .unwrap_or((self.scale.length, self.scale.factor)),
        }
    }

    /// Check every trig sits inside its track's effective length
    pub fn validate(&self, id: PatternId) -> SequencerResult<()> {
        for (voice, track) in self.tracks() {
            let (length, _) = self.effective_scale(voice);
            if let Some(last) = track.last_step() {
                if last > length {
                    return Err(SequencerError::Configuration(format!(
                        "pattern {} track {}: trig at step {} outside length {}",
                        id, voice, last, length
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_length(length: usize) -> SequencerResult<()> {
    if length > MAX_STEP_INDEX {
        return Err(SequencerError::Configuration(format!(
            "length {} exceeds {}",
            length, MAX_STEP_INDEX
        )));
    }
    Ok(())
}

fn check_factor(factor: f64) -> SequencerResult<()> {
    if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&factor) {
        return Err(SequencerError::Configuration(format!(
            "scale factor must be {}-{}, got {}",
            MIN_SCALE_FACTOR, MAX_SCALE_FACTOR, factor
        )));
    }
    Ok(())
}

/// MIDI data bytes are seven bits
pub(crate) fn check_data(what: &str, value: u8) -> SequencerResult<()> {
    if value > MAX_DATA {
        return Err(SequencerError::Configuration(format!(
            "{} must be 0-127, got {}",
            what, value
        )));
    }
    Ok(())
}

/// Durations in milliseconds, up to the clock's longest delay
pub(crate) fn check_ms(what: &str, ms: f64) -> SequencerResult<()> {
    if !(0.0..=MAX_DELAY_MS).contains(&ms) {
        return Err(SequencerError::Configuration(format!(
            "{} must be 0-{} ms, got {}",
            what, MAX_DELAY_MS, ms
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_defaults() {
        let pattern = Pattern::default();
        assert_eq!(pattern.scale.length, 15);
        assert_eq!(pattern.scale.factor, 1.0);
        assert_eq!(pattern.scale.change_bars, 0);
        assert_eq!(pattern.tempo, 120.0);
        assert_eq!(pattern.track_count(), 0);
    }

    #[test]
    fn test_trig_created_with_default_note() {
        let mut pattern = Pattern::default();
        let trig = pattern.track(Voice::T1).trig(4).unwrap();
        assert_eq!(trig.note, Note::default());
        assert_eq!(trig.note.key, keys::C4);
        assert!(trig.lock.is_none());
    }

    #[test]
    fn test_fluent_authoring() {
        let mut pattern = Pattern::default();
        pattern
            .scale(ScaleMode::PerTrack, 15, 4.0, 0)
            .unwrap()
            .tempo(250.0)
            .unwrap();
        pattern.track(Voice::T2).scale(7, 3.0).unwrap();
        pattern
            .track(Voice::T2)
            .trig(0)
            .unwrap()
            .note(keys::A4, 200.0, 120)
            .unwrap()
            .nudge(10.0)
            .unwrap();

        assert_eq!(pattern.tempo, 250.0);
        assert_eq!(pattern.effective_scale(Voice::T2), (7, 3.0));
        let trig = pattern.track_ref(Voice::T2).unwrap().trig_at(0).unwrap();
        assert_eq!(trig.note.velocity, 120);
        assert_eq!(trig.nudge_ms, 10.0);
    }

    #[test]
    fn test_effective_scale_modes() {
        let mut pattern = Pattern::default();
        pattern.scale(ScaleMode::PatternWide, 15, 2.0, 0).unwrap();
        pattern.track(Voice::T1).scale(7, 0.5).unwrap();
        pattern.track(Voice::T3);

        // Pattern-wide ignores the track scale
        assert_eq!(pattern.effective_scale(Voice::T1), (15, 2.0));

        pattern.scale(ScaleMode::PerTrack, 15, 2.0, 0).unwrap();
        assert_eq!(pattern.effective_scale(Voice::T1), (7, 0.5));
        // Track without its own scale falls back to the pattern scale
        assert_eq!(pattern.effective_scale(Voice::T3), (15, 2.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut pattern = Pattern::default();
        assert!(matches!(
            pattern.tempo(0.0),
            Err(SequencerError::Configuration(_))
        ));
        assert!(pattern.scale(ScaleMode::PatternWide, 15, 0.0, 0).is_err());
        assert!(pattern.scale(ScaleMode::PatternWide, 200, 1.0, 0).is_err());

        let track = pattern.track(Voice::T1);
        assert!(track.trig(MAX_STEP_INDEX + 1).is_err());
        assert!(track.parameter(Parameter::COLOR, 128).is_err());

        let trig = track.trig(0).unwrap();
        assert!(trig.note(128, 100.0, 100).is_err());
        assert!(trig.note(60, -1.0, 100).is_err());
        assert!(trig.nudge(-5.0).is_err());
        assert!(trig.scale(f64::NAN).is_err());
    }

    #[test]
    fn test_out_of_range_timing_rejected() {
        let mut pattern = Pattern::default();
        assert!(pattern.tempo(1e-20).is_err());
        assert!(pattern.tempo(f64::INFINITY).is_err());
        assert!(pattern.tempo(MAX_TEMPO + 1.0).is_err());
        assert!(pattern.tempo(MIN_TEMPO).is_ok());
        assert!(pattern.scale(ScaleMode::PatternWide, 15, 1e9, 0).is_err());
        assert!(pattern.scale(ScaleMode::PatternWide, 15, MAX_SCALE_FACTOR, 0).is_ok());

        let trig = pattern.track(Voice::T1).trig(0).unwrap();
        assert!(trig.note(60, 1e25, 100).is_err());
        assert!(trig.note(60, f64::NAN, 100).is_err());
        assert!(trig.nudge(f64::INFINITY).is_err());
        assert!(trig.nudge(MAX_DELAY_MS).is_ok());
        assert_eq!(trig.note.length_ms, Note::default().length_ms);
    }

    #[test]
    fn test_validate_step_outside_length() {
        let mut pattern = Pattern::default();
        pattern.scale(ScaleMode::PatternWide, 7, 1.0, 0).unwrap();
        pattern.track(Voice::T1).trig(7).unwrap();
        assert!(pattern.validate(0).is_ok());

        pattern.track(Voice::T1).trig(8).unwrap();
        assert!(matches!(
            pattern.validate(0),
            Err(SequencerError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_lock_is_inactive() {
        let mut trig = Trig::default();
        trig.lock(ParamMap::new());
        assert!(trig.active_lock().is_none());

        trig.lock(ParamMap::new().with(Parameter::DECAY, 10));
        assert!(trig.active_lock().is_some());
    }
}
