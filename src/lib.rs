// modelseq - step sequencing for Elektron Model:Cycles / Model:Samples over MIDI

pub mod config;
pub mod error;
pub mod messaging;
pub mod midi;
pub mod project;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use config::SequencerConfig;
pub use error::{SequencerError, SequencerResult};
pub use messaging::{Notification, NotificationCategory, NotificationLevel};
pub use midi::{MemoryTransport, MessageKind, MidiMessage, MidirTransport, Transport, TransportError};
pub use project::Project;
pub use sequencer::{
    Chord, Free, Model, Note, ParamMap, Parameter, Pattern, PatternBank, PatternId, Playback,
    PlaybackState, PlaybackStatus, ScaleMode, Sequencer, Track, Trig, Voice, keys,
};
