//! Built-in configuration presets.
//!
//! Each preset is a TOML file under `presets/`, embedded at compile time.
//! They replace what used to be separate capture components differing only
//! in timings and whether manual capture was offered.

use crate::config::AlignmentConfig;
use crate::error::ConfigError;
use serde::Deserialize;
use std::sync::OnceLock;

const PRESET_STANDARD: &str = include_str!("../presets/standard.toml");
const PRESET_QUICK: &str = include_str!("../presets/quick.toml");
const PRESET_KIOSK: &str = include_str!("../presets/kiosk.toml");

pub const DEFAULT_PRESET: &str = "standard";

static PRESET_DB: OnceLock<Vec<PresetFile>> = OnceLock::new();

/// Top-level preset file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct PresetFile {
    pub preset: PresetInfo,
    pub alignment: AlignmentConfig,
}

/// Fields of the `[preset]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
}

fn preset_db() -> &'static Vec<PresetFile> {
    PRESET_DB.get_or_init(|| {
        let mut db = Vec::new();
        for src in [PRESET_STANDARD, PRESET_QUICK, PRESET_KIOSK] {
            match toml::from_str::<PresetFile>(src) {
                Ok(p) => db.push(p),
                Err(e) => tracing::error!(error = %e, "bad preset TOML"),
            }
        }
        db
    })
}

/// Look up a preset by name.
pub fn lookup_preset(name: &str) -> Option<&'static PresetFile> {
    preset_db().iter().find(|p| p.preset.name == name)
}

/// List all built-in presets.
pub fn list_presets() -> &'static [PresetFile] {
    preset_db()
}

/// Resolve a preset name into a validated config.
pub fn preset_config(name: &str) -> Result<AlignmentConfig, ConfigError> {
    let preset =
        lookup_preset(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
    preset.alignment.validate()?;
    Ok(preset.alignment.clone())
}
