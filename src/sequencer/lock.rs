// Lock controller - applies trig locks and restores the track preset once they expire

use crate::sequencer::params::ParamMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Track preset is in effect
    Default,
    /// A trig lock replaced the preset
    Locked,
}

/// Per-track lock state machine
///
/// Returns the parameter map to send for each transition; the caller turns it
/// into one control change per entry.
#[derive(Debug, Clone)]
pub struct LockController {
    state: LockState,
}

impl LockController {
    pub fn new() -> Self {
        Self {
            state: LockState::Default,
        }
    }

    /// Initial burst when the track starts: step 0's lock if any, else the preset
    pub fn start(&mut self, first_lock: Option<&ParamMap>, preset: &ParamMap) -> ParamMap {
        match first_lock {
            Some(lock) => {
                self.state = LockState::Locked;
                *lock
            }
            None => {
                self.state = LockState::Default;
                *preset
            }
        }
    }

    /// Transition for the upcoming step
    ///
    /// A locked step always (re)applies its lock. An unlocked step after a
    /// lock restores the preset once. Otherwise nothing is sent.
    pub fn advance(&mut self, next_lock: Option<&ParamMap>, preset: &ParamMap) -> Option<ParamMap> {
        match (next_lock, self.state) {
            (Some(lock), _) => {
                self.state = LockState::Locked;
                Some(*lock)
            }
            (None, LockState::Locked) => {
                self.state = LockState::Default;
                Some(*preset)
            }
            (None, LockState::Default) => None,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }
}

impl Default for LockController {
    fn default() -> Self {
        Self::new()
    }
}
