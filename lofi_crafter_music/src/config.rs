// Engine configuration, loaded from JSON.
//
// `EngineConfig` holds the timeline resolution and the style catalog. The
// default is the built-in catalog at 480 ticks per beat. A config file only
// needs the parts it changes:
//
//   { "ticks_per_beat": 960,
//     "styles": { "sleep": { "name": "Sleep", "bpm_range": [55, 62], ... } } }
//
// Styles named in the file replace the built-in preset wholesale; styles not
// named keep theirs. A preset's `groove` block may be omitted or partial and
// fills from the default feel.

use crate::error::ComposeError;
use crate::style::{Style, StylePreset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Resolution used when nothing else is configured.
pub const DEFAULT_TICKS_PER_BEAT: u16 = 480;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub ticks_per_beat: u16,
    pub styles: BTreeMap<Style, StylePreset>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            styles: Style::ALL
                .iter()
                .map(|&s| (s, StylePreset::builtin(s)))
                .collect(),
        }
    }
}

/// On-disk shape: everything optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    ticks_per_beat: Option<u16>,
    styles: BTreeMap<Style, StylePreset>,
}

impl EngineConfig {
    /// Parse a JSON config and merge it over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ComposeError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let mut config = EngineConfig::default();
        if let Some(tpb) = file.ticks_per_beat {
            config.ticks_per_beat = tpb;
        }
        config.styles.extend(file.styles);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load a config file, or fall back to the defaults with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load config {}: {e}. Using defaults.", path.display());
                EngineConfig::default()
            }
        }
    }

    /// Preset for a style. A catalog missing the style yields the built-in.
    pub fn preset(&self, style: Style) -> StylePreset {
        self.styles
            .get(&style)
            .cloned()
            .unwrap_or_else(|| StylePreset::builtin(style))
    }
}
