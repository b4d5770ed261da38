// MIDI output - the shared sink every player writes into
// One lock per message: a long lock burst never starves the bypass channel

use crate::midi::event::MidiMessage;
use midir::MidiOutputConnection;
use std::sync::Mutex;
use std::time::Instant;

/// Errors raised while writing a message to the wire
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send MIDI message: {0}")]
    SendFailed(String),

    #[error("MIDI output is closed")]
    Closed,

    #[error("MIDI output lock poisoned")]
    Poisoned,
}

/// Serializes single messages onto the wire
///
/// Implementations must deliver each message atomically and keep the
/// submission order of any single caller. Concurrent callers are allowed.
pub trait Transport: Send + Sync {
    fn send(&self, message: &MidiMessage) -> Result<(), TransportError>;
}

/// Hardware transport backed by a midir output connection
pub struct MidirTransport {
    connection: Mutex<Option<MidiOutputConnection>>,
    port_name: String,
}

impl MidirTransport {
    pub fn new(connection: MidiOutputConnection, port_name: String) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
            port_name,
        }
    }

    /// Name of the port this transport writes to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Close the underlying connection; later sends fail with `Closed`
    pub fn close(&self) {
        if let Ok(mut conn) = self.connection.lock() {
            if let Some(c) = conn.take() {
                let _ = c.close();
                log::info!(target: "Transport", "MIDI output '{}' closed", self.port_name);
            }
        }
    }
}

impl Transport for MidirTransport {
    fn send(&self, message: &MidiMessage) -> Result<(), TransportError> {
        let (bytes, len) = message.to_bytes();
        let mut guard = self.connection.lock().map_err(|_| TransportError::Poisoned)?;
        let conn = guard.as_mut().ok_or(TransportError::Closed)?;
        conn.send(&bytes[..len])
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// A message captured by [`MemoryTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub at: Instant,
    pub message: MidiMessage,
}

/// In-process transport that records every message with its send time
///
/// Used for dry runs and tests. Can be told to reject messages to exercise
/// the error reporting path.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<bool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut f) = self.failing.lock() {
            *f = failing;
        }
    }

    /// Copy of everything sent so far
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages only, without timestamps
    pub fn messages(&self) -> Vec<MidiMessage> {
        self.sent().into_iter().map(|s| s.message).collect()
    }

    /// Remove and return everything sent so far
    pub fn take(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: &MidiMessage) -> Result<(), TransportError> {
        if self.failing.lock().map(|f| *f).unwrap_or(false) {
            return Err(TransportError::SendFailed("memory transport rejecting".into()));
        }
        let mut sent = self.sent.lock().map_err(|_| TransportError::Poisoned)?;
        sent.push(SentMessage {
            at: Instant::now(),
            message: *message,
        });
        Ok(())
    }
}
