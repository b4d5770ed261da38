// MIDI output device discovery

use crate::error::{SequencerError, SequencerResult};
use crate::midi::output::MidirTransport;
use midir::MidiOutput;

#[derive(Clone, Debug)]
pub struct MidiDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Finds and opens MIDI output ports
pub struct OutputDeviceManager {
    client_name: String,
}

impl OutputDeviceManager {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    /// List every MIDI output port currently visible
    pub fn list_output_ports(&self) -> Vec<MidiDeviceInfo> {
        let mut devices = Vec::new();

        if let Ok(midi_out) = MidiOutput::new(&self.client_name) {
            for (index, port) in midi_out.ports().iter().enumerate() {
                if let Ok(name) = midi_out.port_name(port) {
                    devices.push(MidiDeviceInfo {
                        id: format!("midi_out_{}", index),
                        name,
                        is_default: index == 0,
                    });
                }
            }
        }

        devices
    }

    /// Open the first output port whose name contains `fragment`
    ///
    /// Elektron devices announce themselves as e.g. "Elektron Model:Cycles", so
    /// a model fragment is enough to find them.
    pub fn connect(&self, fragment: &str) -> SequencerResult<MidirTransport> {
        let midi_out = MidiOutput::new(&self.client_name)
            .map_err(|e| SequencerError::NoDevice(format!("MIDI init failed: {}", e)))?;

        let ports = midi_out.ports();
        let found = ports.iter().find_map(|p| {
            midi_out
                .port_name(p)
                .ok()
                .filter(|name| matches_fragment(name, fragment))
                .map(|name| (p.clone(), name))
        });

        let Some((port, name)) = found else {
            return Err(SequencerError::NoDevice(format!(
                "no MIDI output matching '{}'",
                fragment
            )));
        };

        let connection = midi_out
            .connect(&port, &format!("{}-out", self.client_name))
            .map_err(|e| SequencerError::NoDevice(format!("{}: {}", name, e)))?;

        log::info!(target: "Device", "MIDI output connected: {}", name);
        Ok(MidirTransport::new(connection, name))
    }
}

fn matches_fragment(port_name: &str, fragment: &str) -> bool {
    port_name.to_lowercase().contains(&fragment.to_lowercase())
}
