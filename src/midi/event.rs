// MIDI message types - what the scheduler hands to the transport
// Channel voice messages only: the instrument is driven with notes, CCs and program changes

use crate::sequencer::machine::Voice;

/// Largest value a MIDI data byte can carry
pub const MAX_DATA: u8 = 127;

/// The four message kinds the instrument understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
    ControlChange { controller: u8, value: u8 },
    ProgramChange { program: u8 },
}

/// A single, already validated channel message addressed to one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    pub voice: Voice,
    pub kind: MessageKind,
}

impl MidiMessage {
    pub fn note_on(voice: Voice, key: u8, velocity: u8) -> Self {
        Self {
            voice,
            kind: MessageKind::NoteOn { key, velocity },
        }
    }

    pub fn note_off(voice: Voice, key: u8) -> Self {
        Self {
            voice,
            kind: MessageKind::NoteOff { key },
        }
    }

    pub fn control_change(voice: Voice, controller: u8, value: u8) -> Self {
        Self {
            voice,
            kind: MessageKind::ControlChange { controller, value },
        }
    }

    pub fn program_change(voice: Voice, program: u8) -> Self {
        Self {
            voice,
            kind: MessageKind::ProgramChange { program },
        }
    }

    /// Note-offs are never suppressed after a stop, everything else is
    pub fn is_note_off(&self) -> bool {
        matches!(self.kind, MessageKind::NoteOff { .. })
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self.kind, MessageKind::NoteOn { .. })
    }

    pub fn is_control_change(&self) -> bool {
        matches!(self.kind, MessageKind::ControlChange { .. })
    }

    /// Encode as raw MIDI bytes (status byte carries the voice channel)
    ///
    /// Note-off is sent as an explicit 0x80 with velocity 0.
    pub fn to_bytes(&self) -> ([u8; 3], usize) {
        let channel = self.voice.channel() & 0x0F;
        match self.kind {
            MessageKind::NoteOn { key, velocity } => {
                ([0x90 | channel, key & MAX_DATA, velocity & MAX_DATA], 3)
            }
            MessageKind::NoteOff { key } => ([0x80 | channel, key & MAX_DATA, 0], 3),
            MessageKind::ControlChange { controller, value } => {
                ([0xB0 | channel, controller & MAX_DATA, value & MAX_DATA], 3)
            }
            MessageKind::ProgramChange { program } => ([0xC0 | channel, program & MAX_DATA, 0], 2),
        }
    }

    /// Parse a raw MIDI message
    ///
    /// Returns `None` for incomplete data, unsupported status bytes and channels
    /// that do not map to one of the six voices.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        let voice = Voice::from_channel(status & 0x0F)?;

        let kind = match status & 0xF0 {
            0x90 if bytes.len() >= 3 => {
                let key = bytes[1];
                let velocity = bytes[2];
                // Velocity 0 = Note Off
                if velocity == 0 {
                    MessageKind::NoteOff { key }
                } else {
                    MessageKind::NoteOn { key, velocity }
                }
            }
            0x80 if bytes.len() >= 3 => MessageKind::NoteOff { key: bytes[1] },
            0xB0 if bytes.len() >= 3 => MessageKind::ControlChange {
                controller: bytes[1],
                value: bytes[2],
            },
            0xC0 if bytes.len() >= 2 => MessageKind::ProgramChange { program: bytes[1] },
            _ => return None,
        };

        Some(Self { voice, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_encoding() {
        let msg = MidiMessage::note_on(Voice::T2, 69, 120);
        let (bytes, len) = msg.to_bytes();
        assert_eq!(&bytes[..len], &[0x91, 69, 120]);
    }

    #[test]
    fn test_program_change_is_two_bytes() {
        let msg = MidiMessage::program_change(Voice::T6, 12);
        let (bytes, len) = msg.to_bytes();
        assert_eq!(len, 2);
        assert_eq!(&bytes[..len], &[0xC5, 12]);
    }

    #[test]
    fn test_note_on_velocity_zero_parses_as_note_off() {
        let msg = MidiMessage::from_bytes(&[0x90, 64, 0]).unwrap();
        assert_eq!(msg.kind, MessageKind::NoteOff { key: 64 });
        assert_eq!(msg.voice, Voice::T1);
    }

    #[test]
    fn test_control_change_parse() {
        let msg = MidiMessage::from_bytes(&[0xB3, 74, 100]).unwrap();
        assert_eq!(msg.voice, Voice::T4);
        assert_eq!(
            msg.kind,
            MessageKind::ControlChange {
                controller: 74,
                value: 100
            }
        );
    }

    #[test]
    fn test_channel_outside_voices_rejected() {
        // Channel 7 has no voice on the Model:Cycles
        assert!(MidiMessage::from_bytes(&[0x97, 60, 100]).is_none());
    }

    #[test]
    fn test_invalid_messages() {
        assert!(MidiMessage::from_bytes(&[]).is_none());
        assert!(MidiMessage::from_bytes(&[0x90, 60]).is_none());
        assert!(MidiMessage::from_bytes(&[0xF0, 0x00, 0x00]).is_none());
    }

    #[test]
    fn test_kind_predicates() {
        assert!(MidiMessage::note_off(Voice::T1, 60).is_note_off());
        assert!(MidiMessage::note_on(Voice::T1, 60, 1).is_note_on());
        assert!(MidiMessage::control_change(Voice::T1, 7, 1).is_control_change());
        assert!(!MidiMessage::program_change(Voice::T1, 1).is_note_off());
    }
}
