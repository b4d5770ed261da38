// Sequencer module
// Pattern data, per-track clocks, chaining and the playback control plane

pub mod bank;
pub mod chain;
pub mod clock;
pub mod controller;
pub mod free;
pub mod keys;
pub mod lock;
pub mod machine;
pub mod params;
pub mod pattern;
pub mod pattern_player;
pub mod playback;
pub mod sink;
pub mod state;
pub mod track_player;

pub use bank::PatternBank;
pub use chain::ChainScheduler;
pub use clock::{Clock, step_period, step_period_ms};
pub use controller::Sequencer;
pub use free::Free;
pub use keys::Chord;
pub use lock::{LockController, LockState};
pub use machine::{DefaultPresets, Machine, Model, Voice};
pub use params::{ParamMap, Parameter};
pub use pattern::{Note, Pattern, PatternId, Scale, ScaleMode, Track, TrackScale, Trig};
pub use pattern_player::PatternPlayer;
pub use playback::{Control, Playback};
pub use sink::{Gate, GatedOutput, MessageSink};
pub use state::{PlaybackState, PlaybackStatus, TrackState};
pub use track_player::{TrackEvent, TrackPlayer};
