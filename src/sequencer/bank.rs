// Pattern bank - authored patterns keyed by id

use crate::error::{SequencerError, SequencerResult};
use crate::sequencer::machine::DefaultPresets;
use crate::sequencer::pattern::{Pattern, PatternId};
use std::collections::BTreeMap;

/// Patterns authored so far
///
/// The sequencer owns one bank for authoring. Playback works on a prepared
/// copy so later edits never reach a running session.
#[derive(Debug, Clone, Default)]
pub struct PatternBank {
    patterns: BTreeMap<PatternId, Pattern>,
}

impl PatternBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern `id`, created with default scale and tempo on first use
    pub fn pattern(&mut self, id: PatternId) -> &mut Pattern {
        self.patterns.entry(id).or_default()
    }

    pub fn get(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(&id)
    }

    pub fn contains(&self, id: PatternId) -> bool {
        self.patterns.contains_key(&id)
    }

    pub fn remove(&mut self, id: PatternId) -> Option<Pattern> {
        self.patterns.remove(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PatternId> + '_ {
        self.patterns.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Copy of the patterns in `ids`, validated, with empty presets filled
    ///
    /// Fails with `NotFound` for an unknown id and `Configuration` for a
    /// pattern whose trigs fall outside their track length.
    pub fn prepare(&self, ids: &[PatternId], defaults: &DefaultPresets) -> SequencerResult<Self> {
        let mut prepared = PatternBank::new();
        for &id in ids {
            if prepared.contains(id) {
                continue;
            }
            let pattern = self.get(id).ok_or(SequencerError::NotFound(id))?;
            pattern.validate(id)?;

            let mut pattern = pattern.clone();
            for (voice, track) in pattern.tracks_mut() {
                if track.preset.is_empty() {
                    track.preset = *defaults.get(*voice);
                }
            }
            prepared.patterns.insert(id, pattern);
        }
        Ok(prepared)
    }
}
