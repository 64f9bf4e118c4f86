//! Capture sinks: downstream consumers of captured stills.

use crate::capture::CapturedImage;
use tokio::sync::mpsc::UnboundedSender;

/// Receives each captured image by value.
pub trait CaptureSink {
    fn submit(&mut self, image: CapturedImage) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("capture queue closed")]
    Closed,
    #[error("capture rejected: {0}")]
    Rejected(String),
}

/// Forwards captures to an async worker.
impl CaptureSink for UnboundedSender<CapturedImage> {
    fn submit(&mut self, image: CapturedImage) -> Result<(), SinkError> {
        self.send(image).map_err(|_| SinkError::Closed)
    }
}

/// Collects captures in memory.
impl CaptureSink for Vec<CapturedImage> {
    fn submit(&mut self, image: CapturedImage) -> Result<(), SinkError> {
        self.push(image);
        Ok(())
    }
}
