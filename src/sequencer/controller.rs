// Sequencer - control plane: authoring bank, play/chain/pause/resume/stop

use crate::error::{SequencerError, SequencerResult};
use crate::messaging::{
    Notification, NotificationCategory, NotificationConsumer, Reporter, create_notification_channel,
    drain,
};
use crate::midi::output::Transport;
use crate::sequencer::bank::PatternBank;
use crate::sequencer::free::Free;
use crate::sequencer::machine::DefaultPresets;
use crate::sequencer::pattern::{Pattern, PatternId};
use crate::sequencer::playback::{Control, Playback, spawn_runner};
use crate::sequencer::sink::{Gate, GatedOutput};
use crate::sequencer::state::{PlaybackState, PlaybackStatus};
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Default notification ring size
pub const NOTIFICATION_CAPACITY: usize = 256;

/// A running (or draining) playback thread
struct Session {
    control_tx: Sender<Control>,
    gate: Gate,
    state: Arc<Mutex<PlaybackState>>,
    handle: JoinHandle<()>,
}

/// Top-level controller
///
/// Owns the pattern bank used for authoring. Each `play`/`play_chain` call
/// snapshots the bank and hands it to a fresh playback thread, so edits made
/// while playing apply to the next session only.
pub struct Sequencer {
    transport: Arc<dyn Transport>,
    bank: PatternBank,
    defaults: DefaultPresets,
    reporter: Reporter,
    notifications: NotificationConsumer,
    status: PlaybackStatus,
    session: Option<Session>,
    /// Stopped sessions still sending note-offs
    retired: Vec<JoinHandle<()>>,
}

impl Sequencer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_defaults(transport, DefaultPresets::default(), NOTIFICATION_CAPACITY)
    }

    pub fn with_defaults(
        transport: Arc<dyn Transport>,
        defaults: DefaultPresets,
        notification_capacity: usize,
    ) -> Self {
        let (tx, notifications) = create_notification_channel(notification_capacity.max(1));
        Self {
            transport,
            bank: PatternBank::new(),
            defaults,
            reporter: Reporter::new(tx),
            notifications,
            status: PlaybackStatus::Stopped,
            session: None,
            retired: Vec::new(),
        }
    }

    /// Pattern `id` for authoring, created on first use
    pub fn pattern(&mut self, id: PatternId) -> &mut Pattern {
        self.bank.pattern(id)
    }

    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut PatternBank {
        &mut self.bank
    }

    pub fn defaults(&self) -> &DefaultPresets {
        &self.defaults
    }

    /// Bypass channel sharing this sequencer's transport
    pub fn free(&self) -> Free {
        Free::new(self.transport.clone(), self.reporter.clone())
    }

    /// Play a single pattern, looping
    pub fn play(&mut self, id: PatternId) -> SequencerResult<()> {
        self.play_chain(&[id])
    }

    /// Play `ids` in order, wrapping to the first after the last
    ///
    /// A running session is stopped first.
    pub fn play_chain(&mut self, ids: &[PatternId]) -> SequencerResult<()> {
        if ids.is_empty() {
            return Err(SequencerError::Configuration(
                "play_chain needs at least one pattern id".to_string(),
            ));
        }
        let bank = Arc::new(self.bank.prepare(ids, &self.defaults)?);
        let playback = Playback::new(bank, ids.to_vec())?.with_reporter(self.reporter.clone());

        self.end_session();

        let gate = Gate::new();
        let sink = GatedOutput::new(self.transport.clone(), gate.clone(), self.reporter.clone());
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let state = Arc::new(Mutex::new(PlaybackState::default()));
        let handle = spawn_runner(playback, sink, control_rx, state.clone())?;

        self.status = PlaybackStatus::Playing;
        self.session = Some(Session {
            control_tx,
            gate,
            state,
            handle,
        });
        log::info!(target: "Sequencer", "playing chain {:?}", ids);
        Ok(())
    }

    pub fn pause(&mut self) -> SequencerResult<()> {
        if self.status != PlaybackStatus::Playing {
            return Err(self.state_error("pause: nothing is playing"));
        }
        self.send(Control::Pause);
        self.status = PlaybackStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> SequencerResult<()> {
        if self.status != PlaybackStatus::Paused {
            return Err(self.state_error("resume: playback is not paused"));
        }
        self.send(Control::Resume);
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    /// Stop playback; no message except pending note-offs is sent once this returns
    ///
    /// Stopping while stopped does nothing.
    pub fn stop(&mut self) {
        if self.session.is_some() {
            self.end_session();
            log::info!(target: "Sequencer", "stopped");
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status() == PlaybackStatus::Playing
    }

    /// Latest snapshot published by the playback thread
    pub fn state(&self) -> PlaybackState {
        let mut state = self
            .session
            .as_ref()
            .and_then(|s| s.state.lock().ok().map(|s| s.clone()))
            .unwrap_or_default();
        state.status = self.status();
        state
    }

    /// Notifications queued since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        drain(&mut self.notifications)
    }

    /// Wait for stopped sessions to deliver their last note-offs
    pub fn join(&mut self) {
        for handle in self.retired.drain(..) {
            if handle.join().is_err() {
                log::error!(target: "Sequencer", "playback thread panicked");
            }
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.gate.close();
            // The runner treats a closed channel as Stop too
            let _ = session.control_tx.send(Control::Stop);
            self.retired.push(session.handle);
        }
        self.retired.retain(|h| !h.is_finished());
        self.status = PlaybackStatus::Stopped;
    }

    fn send(&self, control: Control) {
        if let Some(session) = &self.session {
            let _ = session.control_tx.send(control);
        }
    }

    fn state_error(&self, message: &str) -> SequencerError {
        self.reporter
            .warning(NotificationCategory::Control, message.to_string());
        SequencerError::State(message.to_string())
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}
