// Error types for the sequencer

use crate::midi::output::TransportError;
use crate::sequencer::pattern::PatternId;

/// Sequencer error types
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// Invalid authoring or call arguments (empty chain, bad step index, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Pattern {0} not found")]
    NotFound(PatternId),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Control call that makes no sense in the current playback state
    #[error("Invalid state: {0}")]
    State(String),

    #[error("MIDI device not found: {0}")]
    NoDevice(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] ron::Error),
}

pub type SequencerResult<T> = Result<T, SequencerError>;
