// Playback state - status and the snapshot published by the playback thread

use crate::sequencer::machine::Voice;
use crate::sequencer::pattern::PatternId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Per-track view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackState {
    pub voice: Voice,
    /// Step the next tick plays
    pub step: usize,
    pub lock_active: bool,
    pub scale_override_active: bool,
}

/// What the scheduler is doing right now
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub pattern: Option<PatternId>,
    pub chain_index: usize,
    pub changing: bool,
    pub change_countdown: u32,
    pub tracks: Vec<TrackState>,
}

impl PlaybackState {
    pub fn track(&self, voice: Voice) -> Option<&TrackState> {
        self.tracks.iter().find(|t| t.voice == voice)
    }
}
