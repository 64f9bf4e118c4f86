//! Alignment thresholds and gate timings.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.7;
pub const DEFAULT_MIN_FRONTAL_CONFIDENCE: f32 = 0.8;
pub const DEFAULT_MAX_YAW_DEG: f32 = 20.0;
pub const DEFAULT_MAX_PITCH_DEG: f32 = 20.0;
pub const DEFAULT_MIN_SIZE_RATIO: f32 = 0.08;
pub const DEFAULT_MAX_SIZE_RATIO: f32 = 0.80;
pub const DEFAULT_STABILITY_MS: u64 = 3_000;
pub const DEFAULT_COUNTDOWN_MS: u64 = 3_000;
pub const DEFAULT_COOLDOWN_MS: u64 = 5_000;

/// Tunable knobs of the alignment gate.
///
/// Missing keys in a TOML document fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub min_detection_confidence: f32,
    pub min_frontal_confidence: f32,
    pub max_yaw_deg: f32,
    pub max_pitch_deg: f32,
    /// Lower bound of face area / target region area.
    pub min_size_ratio: f32,
    /// Upper bound of face area / target region area.
    pub max_size_ratio: f32,
    /// Continuous alignment required before an automatic capture.
    pub stability_ms: u64,
    /// Length of the displayed countdown at the end of the stability window.
    pub countdown_ms: u64,
    /// Rest period after every capture attempt.
    pub cooldown_ms: u64,
    pub allow_manual_capture: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_frontal_confidence: DEFAULT_MIN_FRONTAL_CONFIDENCE,
            max_yaw_deg: DEFAULT_MAX_YAW_DEG,
            max_pitch_deg: DEFAULT_MAX_PITCH_DEG,
            min_size_ratio: DEFAULT_MIN_SIZE_RATIO,
            max_size_ratio: DEFAULT_MAX_SIZE_RATIO,
            stability_ms: DEFAULT_STABILITY_MS,
            countdown_ms: DEFAULT_COUNTDOWN_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            allow_manual_capture: true,
        }
    }
}

impl AlignmentConfig {
    pub fn stability(&self) -> Duration {
        Duration::from_millis(self.stability_ms)
    }

    pub fn countdown(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Check value ranges. Durations are unsigned and always valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_frontal_confidence", self.min_frontal_confidence),
            ("min_size_ratio", self.min_size_ratio),
            ("max_size_ratio", self.max_size_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        for (field, value) in [
            ("max_yaw_deg", self.max_yaw_deg),
            ("max_pitch_deg", self.max_pitch_deg),
        ] {
            if !(0.0..=90.0).contains(&value) {
                return Err(ConfigError::InvalidAngle { field, value });
            }
        }
        if self.min_size_ratio > self.max_size_ratio {
            return Err(ConfigError::InvertedSizeRatio {
                min: self.min_size_ratio,
                max: self.max_size_ratio,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }
}
