// Machine - device models, voices and the default presets applied to unconfigured tracks

use crate::sequencer::params::{ParamMap, Parameter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Supported devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    Cycles,
    Samples,
}

impl Model {
    /// Fragment of the MIDI port name the device announces
    pub fn port_fragment(self) -> &'static str {
        match self {
            Model::Cycles => "Model:Cycles",
            Model::Samples => "Model:Samples",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.port_fragment())
    }
}

/// One of the six tracks, each listening on its own MIDI channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Voice {
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
}

impl Voice {
    pub const ALL: [Voice; 6] = [Voice::T1, Voice::T2, Voice::T3, Voice::T4, Voice::T5, Voice::T6];

    /// MIDI channel (0-based)
    pub fn channel(self) -> u8 {
        self as u8
    }

    pub fn from_channel(channel: u8) -> Option<Self> {
        Self::ALL.get(channel as usize).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.index() + 1)
    }
}

/// Model:Cycles synthesis machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Machine {
    Kick,
    Snare,
    Metal,
    Perc,
    Tone,
    Chord,
}

impl Machine {
    /// Factory machine assignment per track
    pub fn for_voice(voice: Voice) -> Self {
        match voice {
            Voice::T1 => Machine::Kick,
            Voice::T2 => Machine::Snare,
            Voice::T3 => Machine::Metal,
            Voice::T4 => Machine::Perc,
            Voice::T5 => Machine::Tone,
            Voice::T6 => Machine::Chord,
        }
    }

    /// Value sent on the MACHINE CC to select this machine
    pub fn cc_value(self) -> u8 {
        self as u8
    }
}

/// Presets applied to tracks that were authored without one
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultPresets {
    presets: [ParamMap; 6],
}

impl DefaultPresets {
    /// Factory defaults for a model
    pub fn for_model(model: Model) -> Self {
        let presets = Voice::ALL.map(|voice| match model {
            Model::Cycles => ParamMap::new()
                .with(Parameter::MACHINE, Machine::for_voice(voice).cc_value())
                .with(Parameter::PAN, 64)
                .with(Parameter::DELAY, 0)
                .with(Parameter::REVERB, 0)
                .with(Parameter::CYCLES_PITCH, 64)
                .with(Parameter::DECAY, 64)
                .with(Parameter::COLOR, 64)
                .with(Parameter::SHAPE, 64)
                .with(Parameter::SWEEP, 0)
                .with(Parameter::CONTOUR, 0)
                .with(Parameter::PUNCH, 0)
                .with(Parameter::GATE, 0),
            Model::Samples => ParamMap::new()
                .with(Parameter::PAN, 64)
                .with(Parameter::DELAY, 0)
                .with(Parameter::REVERB, 0)
                .with(Parameter::PITCH, 64)
                .with(Parameter::SAMPLE_START, 0)
                .with(Parameter::SAMPLE_LENGTH, 127)
                .with(Parameter::CUTOFF, 127)
                .with(Parameter::RESONANCE, 0),
        });
        Self { presets }
    }

    pub fn get(&self, voice: Voice) -> &ParamMap {
        &self.presets[voice.index()]
    }

    pub fn set(&mut self, voice: Voice, preset: ParamMap) {
        self.presets[voice.index()] = preset;
    }

    /// Replace the presets of the voices present in `overrides`
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<Voice, ParamMap>) {
        for (voice, preset) in overrides {
            self.set(*voice, *preset);
        }
    }
}

impl Default for DefaultPresets {
    fn default() -> Self {
        Self::for_model(Model::default())
    }
}
