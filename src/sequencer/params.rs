// Parameters - CC ids and fixed-capacity parameter maps used for presets and locks

use crate::error::SequencerError;
use crate::midi::event::{MAX_DATA, MidiMessage};
use crate::sequencer::machine::Voice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A device parameter, addressed by its MIDI CC number (0-127)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Parameter(u8);

impl Parameter {
    // Shared by both models
    pub const TRACK_LEVEL: Parameter = Parameter(17);
    pub const MUTE: Parameter = Parameter(94);
    pub const PAN: Parameter = Parameter(10);
    pub const SWEEP: Parameter = Parameter(18);
    pub const CONTOUR: Parameter = Parameter(19);
    pub const DELAY: Parameter = Parameter(12);
    pub const REVERB: Parameter = Parameter(13);
    pub const VOLUME_DIST: Parameter = Parameter(7);

    // Model:Cycles
    pub const MACHINE: Parameter = Parameter(64);
    pub const CYCLES_PITCH: Parameter = Parameter(65);
    pub const DECAY: Parameter = Parameter(80);
    pub const COLOR: Parameter = Parameter(16);
    pub const SHAPE: Parameter = Parameter(17);
    pub const PUNCH: Parameter = Parameter(66);
    pub const GATE: Parameter = Parameter(67);

    // Model:Samples
    pub const PITCH: Parameter = Parameter(16);
    pub const SAMPLE_START: Parameter = Parameter(19);
    pub const SAMPLE_LENGTH: Parameter = Parameter(20);
    pub const CUTOFF: Parameter = Parameter(74);
    pub const RESONANCE: Parameter = Parameter(71);
    pub const LOOP: Parameter = Parameter(17);
    pub const REVERSE: Parameter = Parameter(18);

    // Send effects
    pub const DELAY_TIME: Parameter = Parameter(85);
    pub const DELAY_FEEDBACK: Parameter = Parameter(86);
    pub const REVERB_SIZE: Parameter = Parameter(87);
    pub const REVERB_TONE: Parameter = Parameter(88);

    // LFO
    pub const LFO_SPEED: Parameter = Parameter(102);
    pub const LFO_MULTIPLIER: Parameter = Parameter(103);
    pub const LFO_FADE: Parameter = Parameter(104);
    pub const LFO_DEST: Parameter = Parameter(105);
    pub const LFO_WAVEFORM: Parameter = Parameter(106);
    pub const LFO_START_PHASE: Parameter = Parameter(107);
    pub const LFO_RESET: Parameter = Parameter(108);
    pub const LFO_DEPTH: Parameter = Parameter(109);

    /// Parameter for a raw CC number, `None` above 127
    pub fn new(cc: u8) -> Option<Self> {
        (cc <= MAX_DATA).then_some(Self(cc))
    }

    pub fn cc(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Parameter {
    type Error = SequencerError;

    fn try_from(cc: u8) -> Result<Self, Self::Error> {
        Parameter::new(cc).ok_or_else(|| {
            SequencerError::Configuration(format!("CC {} is outside 0-127", cc))
        })
    }
}

impl From<Parameter> for u8 {
    fn from(parameter: Parameter) -> Self {
        parameter.0
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CC{}", self.0)
    }
}

const CAPACITY: usize = MAX_DATA as usize + 1;

/// Parameter id → value map with one slot per CC number
///
/// Iteration is always in ascending CC order, so applying the same map twice
/// emits the same message sequence. Values are clamped to 0-127 on insert.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<u8, u8>", into = "BTreeMap<u8, u8>")]
pub struct ParamMap {
    values: [u8; CAPACITY],
    present: u128,
}

impl ParamMap {
    pub const fn new() -> Self {
        Self {
            values: [0; CAPACITY],
            present: 0,
        }
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, parameter: Parameter, value: u8) -> Option<u8> {
        let previous = self.get(parameter);
        let idx = parameter.cc() as usize;
        self.values[idx] = value.min(MAX_DATA);
        self.present |= 1u128 << idx;
        previous
    }

    /// Builder-style insert
    pub fn with(mut self, parameter: Parameter, value: u8) -> Self {
        self.insert(parameter, value);
        self
    }

    pub fn get(&self, parameter: Parameter) -> Option<u8> {
        let idx = parameter.cc() as usize;
        (self.present & (1u128 << idx) != 0).then(|| self.values[idx])
    }

    pub fn remove(&mut self, parameter: Parameter) -> Option<u8> {
        let previous = self.get(parameter);
        let idx = parameter.cc() as usize;
        self.values[idx] = 0;
        self.present &= !(1u128 << idx);
        previous
    }

    pub fn contains(&self, parameter: Parameter) -> bool {
        self.get(parameter).is_some()
    }

    pub fn len(&self) -> usize {
        self.present.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.present == 0
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// `(parameter, value)` pairs in ascending CC order
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, u8)> + '_ {
        (0..CAPACITY)
            .filter(move |&i| self.present & (1u128 << i) != 0)
            .map(move |i| (Parameter(i as u8), self.values[i]))
    }

    /// One control change per entry
    pub fn to_messages(&self, voice: Voice) -> Vec<MidiMessage> {
        self.iter()
            .map(|(p, v)| MidiMessage::control_change(voice, p.cc(), v))
            .collect()
    }
}

impl Default for ParamMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(Parameter, u8)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (Parameter, u8)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (p, v) in iter {
            map.insert(p, v);
        }
        map
    }
}

impl From<BTreeMap<u8, u8>> for ParamMap {
    fn from(raw: BTreeMap<u8, u8>) -> Self {
        raw.into_iter()
            .filter_map(|(cc, v)| Parameter::new(cc).map(|p| (p, v)))
            .collect()
    }
}

impl From<ParamMap> for BTreeMap<u8, u8> {
    fn from(map: ParamMap) -> Self {
        map.iter().map(|(p, v)| (p.cc(), v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_range() {
        assert_eq!(Parameter::new(127).map(|p| p.cc()), Some(127));
        assert!(Parameter::new(128).is_none());
        assert!(Parameter::try_from(200).is_err());
        assert_eq!(u8::from(Parameter::DECAY), 80);
    }

    #[test]
    fn test_deserialized_parameter_is_checked() {
        assert_eq!(ron::from_str::<Parameter>("74").unwrap(), Parameter::CUTOFF);
        assert!(ron::from_str::<Parameter>("200").is_err());
        assert_eq!(ron::to_string(&Parameter::GATE).unwrap(), "67");
    }

    #[test]
    fn test_insert_get_remove() {
        let mut map = ParamMap::new();
        assert!(map.is_empty());

        assert_eq!(map.insert(Parameter::COLOR, 100), None);
        assert_eq!(map.insert(Parameter::COLOR, 90), Some(100));
        assert_eq!(map.get(Parameter::COLOR), Some(90));
        assert_eq!(map.len(), 1);

        assert_eq!(map.remove(Parameter::COLOR), Some(90));
        assert!(map.is_empty());
    }

    #[test]
    fn test_values_clamped() {
        let map = ParamMap::new().with(Parameter::DECAY, 200);
        assert_eq!(map.get(Parameter::DECAY), Some(127));
    }

    #[test]
    fn test_iteration_is_ascending() {
        let map = ParamMap::new()
            .with(Parameter::LFO_DEPTH, 1)
            .with(Parameter::PAN, 2)
            .with(Parameter::MACHINE, 3);
        let ccs: Vec<u8> = map.iter().map(|(p, _)| p.cc()).collect();
        assert_eq!(ccs, vec![10, 64, 109]);
    }

    #[test]
    fn test_to_messages() {
        let map = ParamMap::new()
            .with(Parameter::GATE, 1)
            .with(Parameter::PUNCH, 0);
        let msgs = map.to_messages(Voice::T3);
        assert_eq!(
            msgs,
            vec![
                MidiMessage::control_change(Voice::T3, 66, 0),
                MidiMessage::control_change(Voice::T3, 67, 1),
            ]
        );
    }

    #[test]
    fn test_ron_form_is_a_plain_map() {
        let map = ParamMap::new().with(Parameter::COLOR, 100);
        let text = ron::to_string(&map).unwrap();
        let back: ParamMap = ron::from_str(&text).unwrap();
        assert_eq!(back, map);

        let parsed: ParamMap = ron::from_str("{64: 2, 200: 5}").unwrap();
        assert_eq!(parsed.get(Parameter::MACHINE), Some(2));
        assert_eq!(parsed.len(), 1);
    }
}
