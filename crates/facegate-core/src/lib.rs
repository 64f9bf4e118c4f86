//! facegate-core — Face alignment gating for automatic photo capture.
//!
//! Turns per-frame face detections into capture decisions: checks whether a
//! face is well aligned inside a target region, holds it for a stability
//! period, issues exactly one capture, then rests for a cooldown.

pub mod alignment;
pub mod config;
pub mod error;
pub mod gate;
pub mod pose;
pub mod presets;
pub mod readiness;
pub mod region;
pub mod types;

pub use alignment::{AlignmentCheck, Rejection};
pub use config::AlignmentConfig;
pub use error::{CaptureError, ConfigError, GateError};
pub use gate::{
    AlignmentGate, CaptureOutcome, CaptureTicket, CaptureTrigger, GateState, GateUpdate, Phase,
};
pub use pose::{estimate_pose, PoseEstimate};
pub use readiness::DetectorReadiness;
pub use region::{CanvasSize, TargetRegion};
pub use types::{BoundingBox, DetectionFrame, FaceObservation, Landmarks, RawDetection};
