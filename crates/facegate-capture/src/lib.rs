//! facegate-capture — Raw frames, overlays, and the capture action.

pub mod capture;
pub mod frame;
pub mod overlay;
pub mod session;
pub mod sink;
pub mod source;

pub use capture::{capture_target, CapturedImage, EncodeFormat};
pub use frame::{FrameError, VideoFrame};
pub use overlay::OverlayCanvas;
pub use session::{CaptureSession, StepReport};
pub use sink::{CaptureSink, SinkError};
pub use source::{FrameSource, LatestFrame, SourceError};
