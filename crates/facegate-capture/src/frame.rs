//! Raw video frames: the unannotated pixels captures are cut from.

use image::RgbImage;
use std::path::Path;
use std::time::Instant;

/// A raw RGB video frame.
///
/// Never drawn on: debug graphics go to an [`OverlayCanvas`](crate::overlay::OverlayCanvas)
/// built from a copy.
#[derive(Clone)]
pub struct VideoFrame {
    image: RgbImage,
    pub timestamp: Instant,
    pub sequence: u32,
    ready: bool,
}

impl VideoFrame {
    pub fn new(image: RgbImage, sequence: u32) -> Self {
        Self {
            image,
            timestamp: Instant::now(),
            sequence,
            ready: true,
        }
    }

    /// Wrap packed RGB8 bytes (width * height * 3).
    pub fn from_rgb(
        width: u32,
        height: u32,
        data: Vec<u8>,
        sequence: u32,
    ) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        let image = RgbImage::from_raw(width, height, data).ok_or(FrameError::InvalidLength {
            expected,
            actual: 0,
        })?;
        Ok(Self::new(image, sequence))
    }

    /// Load a still image from disk as the raw frame.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let image = image::open(path)
            .map_err(|e| FrameError::Decode(format!("{}: {e}", path.display())))?
            .to_rgb8();
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded still frame"
        );
        Ok(Self::new(image, 0))
    }

    /// A frame whose stream has not delivered data yet.
    pub fn not_ready(width: u32, height: u32) -> Self {
        Self {
            ready: false,
            ..Self::new(RgbImage::new(width, height), 0)
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid RGB length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("failed to decode image: {0}")]
    Decode(String),
}
