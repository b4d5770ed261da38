// Project - one device: its model, the sequencer driving it and the bypass channel

use crate::config::SequencerConfig;
use crate::error::SequencerResult;
use crate::midi::device::OutputDeviceManager;
use crate::midi::output::Transport;
use crate::sequencer::controller::Sequencer;
use crate::sequencer::free::Free;
use crate::sequencer::machine::Model;
use std::sync::Arc;

/// Entry point for driving one instrument
pub struct Project {
    config: SequencerConfig,
    port_name: Option<String>,
    pub sequencer: Sequencer,
    pub free: Free,
}

impl Project {
    /// Connect to the first output port matching the configured fragment
    pub fn connect(config: SequencerConfig) -> SequencerResult<Self> {
        config.validate()?;
        let manager = OutputDeviceManager::new(config.client_name.clone());
        let transport = manager.connect(config.port_fragment())?;
        let port_name = transport.port_name().to_string();

        let mut project = Self::with_transport(config, Arc::new(transport))?;
        project.port_name = Some(port_name);
        Ok(project)
    }

    /// Drive `transport` instead of hardware
    pub fn with_transport(
        config: SequencerConfig,
        transport: Arc<dyn Transport>,
    ) -> SequencerResult<Self> {
        config.validate()?;
        let sequencer = Sequencer::with_defaults(
            transport,
            config.default_presets(),
            config.notification_capacity,
        );
        let free = sequencer.free();
        log::info!(target: "Project", "{} project ready", config.model);

        Ok(Self {
            config,
            port_name: None,
            sequencer,
            free,
        })
    }

    pub fn model(&self) -> Model {
        self.config.model
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Hardware port in use, `None` for a caller-supplied transport
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }
}
