// Free - bypass channel writing straight to the transport, outside any playback session

use crate::error::SequencerResult;
use crate::messaging::Reporter;
use crate::midi::event::MidiMessage;
use crate::midi::output::Transport;
use crate::sequencer::clock::millis;
use crate::sequencer::machine::Voice;
use crate::sequencer::params::{ParamMap, Parameter};
use crate::sequencer::pattern::{check_data, check_ms};
use std::sync::Arc;
use std::thread;

/// Immediate messages, independent of the sequencer state
///
/// Every call sends right away. Bursts are written one message at a time, so
/// a playback thread can interleave with a long preset.
#[derive(Clone)]
pub struct Free {
    transport: Arc<dyn Transport>,
    reporter: Reporter,
}

impl Free {
    pub fn new(transport: Arc<dyn Transport>, reporter: Reporter) -> Self {
        Self {
            transport,
            reporter,
        }
    }

    /// Send every parameter of `preset` as a control change
    pub fn preset(&self, voice: Voice, preset: &ParamMap) -> SequencerResult<()> {
        for message in preset.to_messages(voice) {
            self.transport.send(&message)?;
        }
        Ok(())
    }

    /// Apply `presets` in order, play the note and release it after `duration_ms`
    ///
    /// The release runs on a detached timer thread; the call returns after the
    /// note-on is sent.
    pub fn note(
        &self,
        voice: Voice,
        key: u8,
        velocity: u8,
        duration_ms: f64,
        presets: &[ParamMap],
    ) -> SequencerResult<()> {
        check_data("key", key)?;
        check_data("velocity", velocity)?;
        check_ms("note duration", duration_ms)?;
        for preset in presets {
            self.preset(voice, preset)?;
        }
        self.transport
            .send(&MidiMessage::note_on(voice, key, velocity))?;

        let transport = self.transport.clone();
        let reporter = self.reporter.clone();
        let length = millis(duration_ms);
        thread::Builder::new()
            .name("modelseq-free-release".to_string())
            .spawn(move || {
                spin_sleep::sleep(length);
                if let Err(e) = transport.send(&MidiMessage::note_off(voice, key)) {
                    reporter.transport_error(voice, format!("release of note {} failed: {}", key, e));
                }
            })?;
        Ok(())
    }

    pub fn control_change(&self, voice: Voice, parameter: Parameter, value: u8) -> SequencerResult<()> {
        check_data("value", value)?;
        self.transport
            .send(&MidiMessage::control_change(voice, parameter.cc(), value))?;
        Ok(())
    }

    pub fn program_change(&self, voice: Voice, program: u8) -> SequencerResult<()> {
        check_data("program", program)?;
        self.transport
            .send(&MidiMessage::program_change(voice, program))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequencerError;
    use crate::midi::output::MemoryTransport;
    use std::time::Duration;

    fn free() -> (Free, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new());
        let (reporter, _rx) = Reporter::detached(8);
        (Free::new(transport.clone(), reporter), transport)
    }

    #[test]
    fn test_preset_sends_each_parameter() {
        let (free, transport) = free();
        let preset = ParamMap::new()
            .with(Parameter::DECAY, 20)
            .with(Parameter::COLOR, 30);
        free.preset(Voice::T5, &preset).unwrap();
        assert_eq!(
            transport.messages(),
            vec![
                MidiMessage::control_change(Voice::T5, 16, 30),
                MidiMessage::control_change(Voice::T5, 80, 20),
            ]
        );
    }

    #[test]
    fn test_note_releases_after_duration() {
        let (free, transport) = free();
        let lock = ParamMap::new().with(Parameter::PUNCH, 1);
        free.note(Voice::T1, 64, 90, 30.0, &[lock]).unwrap();

        assert_eq!(
            transport.messages(),
            vec![
                MidiMessage::control_change(Voice::T1, 66, 1),
                MidiMessage::note_on(Voice::T1, 64, 90),
            ]
        );

        std::thread::sleep(Duration::from_millis(300));
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].message, MidiMessage::note_off(Voice::T1, 64));
        assert!(sent[2].at - sent[1].at >= Duration::from_millis(30));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let (free, transport) = free();
        assert!(free.program_change(Voice::T1, 128).is_err());
        assert!(free.control_change(Voice::T1, Parameter::COLOR, 200).is_err());
        assert!(free.note(Voice::T1, 200, 100, 10.0, &[]).is_err());
        assert!(free.note(Voice::T1, 60, 100, 1e25, &[]).is_err());
        assert!(free.note(Voice::T1, 60, 100, -1.0, &[]).is_err());
        assert!(transport.is_empty());
    }

    #[test]
    fn test_transport_failure_surfaces() {
        let (free, transport) = free();
        transport.set_failing(true);
        assert!(matches!(
            free.program_change(Voice::T2, 1),
            Err(SequencerError::Transport(_))
        ));
    }
}
