//! Frame sources: where the session reads the raw frame at capture time.

use crate::frame::VideoFrame;

/// Provides the most recent raw video frame.
pub trait FrameSource {
    fn current_frame(&self) -> Result<&VideoFrame, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no frame received yet")]
    NoFrame,
    #[error("video source disconnected")]
    Disconnected,
}

/// Holds whichever frame was pushed last.
#[derive(Default)]
pub struct LatestFrame {
    frame: Option<VideoFrame>,
    closed: bool,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source pre-loaded with a single still frame.
    pub fn still(frame: VideoFrame) -> Self {
        Self {
            frame: Some(frame),
            closed: false,
        }
    }

    /// Replace the current frame.
    pub fn push(&mut self, frame: VideoFrame) {
        tracing::trace!(sequence = frame.sequence, "frame pushed");
        self.frame = Some(frame);
    }

    /// Mark the stream ended; later reads fail.
    pub fn close(&mut self) {
        self.frame = None;
        self.closed = true;
    }
}

impl FrameSource for LatestFrame {
    fn current_frame(&self) -> Result<&VideoFrame, SourceError> {
        match (&self.frame, self.closed) {
            (_, true) => Err(SourceError::Disconnected),
            (Some(frame), false) => Ok(frame),
            (None, false) => Err(SourceError::NoFrame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_empty_source() {
        let source = LatestFrame::new();
        assert!(matches!(source.current_frame(), Err(SourceError::NoFrame)));
    }

    #[test]
    fn test_push_replaces_frame() {
        let mut source = LatestFrame::new();
        source.push(VideoFrame::new(RgbImage::new(4, 4), 1));
        source.push(VideoFrame::new(RgbImage::new(4, 4), 2));
        assert_eq!(source.current_frame().unwrap().sequence, 2);
    }

    #[test]
    fn test_closed_source() {
        let mut source = LatestFrame::still(VideoFrame::new(RgbImage::new(4, 4), 1));
        source.close();
        assert!(matches!(
            source.current_frame(),
            Err(SourceError::Disconnected)
        ));
    }
}
