// Sequencer configuration - device model, MIDI client settings and preset overrides, stored as RON

use crate::error::{SequencerError, SequencerResult};
use crate::sequencer::machine::{DefaultPresets, Model, Voice};
use crate::sequencer::params::ParamMap;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Everything needed to build a [`crate::Project`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub model: Model,
    /// Client name announced to the MIDI backend
    pub client_name: String,
    /// Port name fragment to look for; the model's own fragment when unset
    pub port_fragment: Option<String>,
    /// Ring size of the notification channel
    pub notification_capacity: usize,
    /// Presets replacing the factory defaults for unconfigured tracks
    pub default_presets: BTreeMap<Voice, ParamMap>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            model: Model::Cycles,
            client_name: "modelseq".to_string(),
            port_fragment: None,
            notification_capacity: crate::sequencer::controller::NOTIFICATION_CAPACITY,
            default_presets: BTreeMap::new(),
        }
    }
}

impl SequencerConfig {
    pub fn for_model(model: Model) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn from_ron_str(text: &str) -> SequencerResult<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SequencerResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&text)?;
        log::info!(target: "Config", "loaded {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_ron_string(&self) -> SequencerResult<String> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SequencerResult<()> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> SequencerResult<()> {
        if self.client_name.trim().is_empty() {
            return Err(SequencerError::Configuration(
                "client_name must not be empty".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(SequencerError::Configuration(
                "notification_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Port fragment to match against output port names
    pub fn port_fragment(&self) -> &str {
        self.port_fragment
            .as_deref()
            .unwrap_or(self.model.port_fragment())
    }

    /// Factory presets for the model with the configured overrides applied
    pub fn default_presets(&self) -> DefaultPresets {
        let mut presets = DefaultPresets::for_model(self.model);
        presets.apply_overrides(&self.default_presets);
        presets
    }
}
