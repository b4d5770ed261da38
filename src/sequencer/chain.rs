// Chain scheduler - looping playlist of patterns with a counted handoff

use crate::error::{SequencerError, SequencerResult};
use crate::sequencer::pattern::PatternId;

/// Position in the chain and the state of a pending handoff
#[derive(Debug, Clone)]
pub struct ChainScheduler {
    chain: Vec<PatternId>,
    index: usize,
    changing: bool,
    countdown: u32,
}

impl ChainScheduler {
    pub fn new(chain: Vec<PatternId>) -> SequencerResult<Self> {
        if chain.is_empty() {
            return Err(SequencerError::Configuration(
                "a chain needs at least one pattern".to_string(),
            ));
        }
        Ok(Self {
            chain,
            index: 0,
            changing: false,
            countdown: 0,
        })
    }

    pub fn current(&self) -> PatternId {
        self.chain[self.index]
    }

    /// Pattern that plays after the current one
    pub fn upcoming(&self) -> PatternId {
        self.chain[(self.index + 1) % self.chain.len()]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_changing(&self) -> bool {
        self.changing
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn patterns(&self) -> &[PatternId] {
        &self.chain
    }

    /// Feed one end-of-pattern tick of the current pattern
    ///
    /// The tick comes from the lead track, or from the conductor when there is
    /// none. `ended` is its end-of-pattern flag and `change_bars` the
    /// current pattern's handoff delay in steps. Returns the pattern to start
    /// now, if the handoff is due on this tick.
    pub fn on_conductor_tick(&mut self, ended: bool, change_bars: u32) -> Option<PatternId> {
        if self.chain.len() < 2 {
            return None;
        }

        if self.changing {
            self.countdown = self.countdown.saturating_sub(1);
        } else if ended {
            self.changing = true;
            self.countdown = change_bars;
        } else {
            return None;
        }

        if self.countdown == 0 {
            self.changing = false;
            self.index = (self.index + 1) % self.chain.len();
            Some(self.current())
        } else {
            None
        }
    }
}
