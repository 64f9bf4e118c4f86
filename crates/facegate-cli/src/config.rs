use facegate_capture::EncodeFormat;
use facegate_core::presets::{self, DEFAULT_PRESET};
use facegate_core::region::{DEFAULT_REGION_HEIGHT_FRACTION, DEFAULT_REGION_WIDTH_FRACTION};
use facegate_core::{AlignmentConfig, CanvasSize, ConfigError, TargetRegion};
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Built-in preset used when no config file is given (default: standard).
    pub preset: String,
    /// TOML file with an `AlignmentConfig`; overrides the preset.
    pub config_file: Option<PathBuf>,
    /// Directory the capture queue writes into.
    pub output_dir: PathBuf,
    /// Logical canvas the target region is laid out on.
    pub canvas: CanvasSize,
    /// Target region width as a fraction of the canvas.
    pub region_width_fraction: f32,
    /// Target region height as a fraction of the canvas.
    pub region_height_fraction: f32,
    /// Encoding for captured stills.
    pub encode_format: EncodeFormat,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let output_dir = var("FACEGATE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("captures"));

        let encode_format = match var("FACEGATE_ENCODE_FORMAT") {
            Some(raw) => raw.parse::<EncodeFormat>().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "ignoring FACEGATE_ENCODE_FORMAT");
                EncodeFormat::default()
            }),
            None => EncodeFormat::default(),
        };

        let defaults = CanvasSize::default();
        Self {
            preset: var("FACEGATE_PRESET").unwrap_or_else(|| DEFAULT_PRESET.to_string()),
            config_file: var("FACEGATE_CONFIG").map(PathBuf::from),
            output_dir,
            canvas: CanvasSize {
                width: parse_or(&var, "FACEGATE_CANVAS_WIDTH", defaults.width),
                height: parse_or(&var, "FACEGATE_CANVAS_HEIGHT", defaults.height),
            },
            region_width_fraction: parse_or(
                &var,
                "FACEGATE_REGION_WIDTH",
                DEFAULT_REGION_WIDTH_FRACTION,
            ),
            region_height_fraction: parse_or(
                &var,
                "FACEGATE_REGION_HEIGHT",
                DEFAULT_REGION_HEIGHT_FRACTION,
            ),
            encode_format,
        }
    }

    /// Resolve the alignment thresholds: config file if set, else the preset.
    pub fn alignment(&self) -> Result<AlignmentConfig, ConfigError> {
        match &self.config_file {
            Some(path) => AlignmentConfig::from_toml_file(path),
            None => presets::preset_config(&self.preset),
        }
    }

    /// The session's target region, centred on the canvas.
    pub fn region(&self) -> TargetRegion {
        TargetRegion::centered(
            self.canvas,
            self.region_width_fraction,
            self.region_height_fraction,
        )
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.preset, "standard");
        assert_eq!(config.config_file, None);
        assert_eq!(config.output_dir, PathBuf::from("captures"));
        assert_eq!(config.canvas, CanvasSize::default());
        assert_eq!(config.encode_format, EncodeFormat::default());
        assert_eq!(config.alignment().unwrap(), AlignmentConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("FACEGATE_PRESET", "quick"),
            ("FACEGATE_OUTPUT_DIR", "/tmp/out"),
            ("FACEGATE_CANVAS_WIDTH", "1280"),
            ("FACEGATE_CANVAS_HEIGHT", "720"),
            ("FACEGATE_REGION_WIDTH", "0.4"),
            ("FACEGATE_ENCODE_FORMAT", "png"),
        ]));
        assert_eq!(config.preset, "quick");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.canvas, CanvasSize { width: 1280, height: 720 });
        assert_eq!(config.encode_format, EncodeFormat::Png);
        assert_eq!(config.alignment().unwrap().stability_ms, 1_500);

        let rect = config.region().rect();
        assert!((rect.width - 512.0).abs() < 1e-3);
        assert!((rect.x - 384.0).abs() < 1e-3);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("FACEGATE_CANVAS_WIDTH", "wide"),
            ("FACEGATE_ENCODE_FORMAT", "gif"),
        ]));
        assert_eq!(config.canvas.width, 640);
        assert_eq!(config.encode_format, EncodeFormat::default());
    }

    #[test]
    fn test_unknown_preset() {
        let config = Config::from_lookup(lookup(&[("FACEGATE_PRESET", "nope")]));
        assert!(matches!(
            config.alignment(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_config_file_overrides_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "stability_ms = 1200\ncooldown_ms = 900\n").unwrap();
        let config = Config::from_lookup(lookup(&[
            ("FACEGATE_PRESET", "kiosk"),
            ("FACEGATE_CONFIG", path.to_str().unwrap()),
        ]));
        let alignment = config.alignment().unwrap();
        assert_eq!(alignment.stability_ms, 1_200);
        assert_eq!(alignment.cooldown_ms, 900);
        assert!(alignment.allow_manual_capture);
    }
}
