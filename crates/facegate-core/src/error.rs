use std::time::Duration;
use thiserror::Error;

/// Rejections and skips raised by the alignment gate.
///
/// None of these are fatal: the gate absorbs them and reports them through
/// its status message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("face detector is not ready")]
    DetectorUnavailable,
    #[error("a capture is already in progress")]
    ReentrantCaptureRejected,
    #[error("please wait {}s before the next capture", remaining_secs(.remaining))]
    CoolingDown { remaining: Duration },
    #[error("manual capture is disabled")]
    ManualCaptureDisabled,
    #[error("camera session is stopped")]
    Stopped,
    #[error("capture ticket does not belong to the active capture")]
    StaleTicket,
}

/// Failures of the capture action. All of them still move the gate into cooldown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("video frame unavailable: {0}")]
    CaptureUnavailable(String),
    #[error(
        "target region {x},{y} {width}x{height} exceeds the {frame_width}x{frame_height} frame"
    )]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("encoding failed: {0}")]
    EncodeFailure(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("{field} must be within [0, 90] degrees, got {value}")]
    InvalidAngle { field: &'static str, value: f32 },
    #[error("size ratio bounds are inverted: min {min} > max {max}")]
    InvertedSizeRatio { min: f32, max: f32 },
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Whole seconds left, rounded up so "0s" is never shown while still waiting.
pub(crate) fn remaining_secs(remaining: &Duration) -> u64 {
    let millis = remaining.as_millis() as u64;
    millis.div_ceil(1000)
}
