// Message sinks - where scheduled messages go once their deadline is reached

use crate::messaging::Reporter;
use crate::midi::event::MidiMessage;
use crate::midi::output::Transport;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Receiver of scheduler output
///
/// `at` is the instant the scheduler handled the message, which is the exact
/// deadline when stepping offline.
pub trait MessageSink {
    fn emit(&mut self, at: Instant, message: MidiMessage);
}

/// Collects output in memory, used for offline rendering
impl MessageSink for Vec<(Instant, MidiMessage)> {
    fn emit(&mut self, at: Instant, message: MidiMessage) {
        self.push((at, message));
    }
}

/// Open/closed switch shared between the control plane and a playback thread
///
/// Closing takes the write lock, so once `close` returns no gated message is
/// in flight and none will follow.
#[derive(Debug, Clone)]
pub struct Gate {
    open: Arc<RwLock<bool>>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            open: Arc::new(RwLock::new(true)),
        }
    }

    pub fn close(&self) {
        let mut open = self.open.write().unwrap_or_else(|e| e.into_inner());
        *open = false;
    }

    pub fn is_open(&self) -> bool {
        *self.open.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` only while the gate is open, holding it open meanwhile
    fn pass<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.open.read().unwrap_or_else(|e| e.into_inner());
        if *open { Some(f()) } else { None }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// Real-time sink: sends through the shared transport
///
/// Note-offs always go out. Everything else is dropped once the gate closes.
/// Send failures are reported and playback carries on.
pub struct GatedOutput {
    transport: Arc<dyn Transport>,
    gate: Gate,
    reporter: Reporter,
    failures: u64,
}

impl GatedOutput {
    pub fn new(transport: Arc<dyn Transport>, gate: Gate, reporter: Reporter) -> Self {
        Self {
            transport,
            gate,
            reporter,
            failures: 0,
        }
    }

    /// Messages that failed to send so far
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl MessageSink for GatedOutput {
    fn emit(&mut self, _at: Instant, message: MidiMessage) {
        let result = if message.is_note_off() {
            self.transport.send(&message)
        } else {
            match self.gate.pass(|| self.transport.send(&message)) {
                Some(result) => result,
                None => return,
            }
        };

        if let Err(e) = result {
            self.failures += 1;
            self.reporter
                .transport_error(message.voice, format!("{:?} not sent: {}", message.kind, e));
        }
    }
}
