// Notifications - problems and events reported by the playback thread and the bypass channel

use crate::sequencer::machine::Voice;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Where the notification comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    /// A message could not be written to the wire
    Transport,
    /// Scheduler events (pattern handoffs, session end)
    Playback,
    /// Control-plane misuse (pause while stopped, ...)
    Control,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    /// Voice the report concerns, when it concerns a single one
    pub voice: Option<Voice>,
    /// Same clock as playback deadlines
    pub at: Instant,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        category: NotificationCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            voice: None,
            at: Instant::now(),
        }
    }

    pub fn on_voice(mut self, voice: Voice) -> Self {
        self.voice = Some(voice);
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] ", self.level, self.category)?;
        if let Some(voice) = self.voice {
            write!(f, "{}: ", voice)?;
        }
        f.write_str(&self.message)
    }
}
