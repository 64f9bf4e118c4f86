//! Capture action: crop the target region out of the raw frame and encode it.

use crate::frame::VideoFrame;
use chrono::{DateTime, Utc};
use facegate_core::{CaptureError, CaptureTrigger, TargetRegion};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

// --- Named constants (no magic numbers) ---
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Output encoding for captured stills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "format")]
pub enum EncodeFormat {
    Jpeg { quality: u8 },
    Png,
}

impl Default for EncodeFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EncodeFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for EncodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg { quality } => write!(f, "jpeg:{quality}"),
            Self::Png => f.write_str("png"),
        }
    }
}

/// Parses `png`, `jpeg`, `jpg`, or `jpeg:<quality>`.
impl FromStr for EncodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, quality) = match lower.split_once(':') {
            Some((name, q)) => (name, Some(q)),
            None => (lower.as_str(), None),
        };
        match (name, quality) {
            ("png", None) => Ok(Self::Png),
            ("jpeg" | "jpg", None) => Ok(Self::default()),
            ("jpeg" | "jpg", Some(q)) => match q.parse::<u8>() {
                Ok(quality @ 1..=100) => Ok(Self::Jpeg { quality }),
                _ => Err(format!("JPEG quality must be 1-100, got '{q}'")),
            },
            _ => Err(format!("unknown encode format '{s}' (expected png or jpeg)")),
        }
    }
}

/// An encoded still, moved by value into a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub data: Vec<u8>,
    pub format: EncodeFormat,
    pub width: u32,
    pub height: u32,
    pub trigger: CaptureTrigger,
    pub captured_at: DateTime<Utc>,
}

/// Pixel rectangle of the target region inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scale the region to the frame and round to whole pixels.
///
/// Fails if the rounded rectangle does not lie entirely inside the frame.
pub fn region_pixels(
    region: &TargetRegion,
    frame_width: u32,
    frame_height: u32,
) -> Result<PixelRect, CaptureError> {
    let rect = region.scaled_to(frame_width, frame_height);
    let x = rect.x.round() as i64;
    let y = rect.y.round() as i64;
    let width = rect.width.round().max(0.0) as i64;
    let height = rect.height.round().max(0.0) as i64;

    let out_of_bounds = x < 0
        || y < 0
        || x + width > frame_width as i64
        || y + height > frame_height as i64;
    if out_of_bounds {
        return Err(CaptureError::RegionOutOfBounds {
            x: x.max(0) as u32,
            y: y.max(0) as u32,
            width: width as u32,
            height: height as u32,
            frame_width,
            frame_height,
        });
    }
    Ok(PixelRect {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Copy exactly the target region out of the raw frame.
pub fn crop_region(frame: &VideoFrame, region: &TargetRegion) -> Result<RgbImage, CaptureError> {
    if !frame.is_ready() {
        return Err(CaptureError::CaptureUnavailable("video stream not ready".into()));
    }
    if frame.width() == 0 || frame.height() == 0 {
        return Err(CaptureError::CaptureUnavailable(format!(
            "video frame has no pixels ({}x{})",
            frame.width(),
            frame.height()
        )));
    }
    let px = region_pixels(region, frame.width(), frame.height())?;
    if px.width == 0 || px.height == 0 {
        return Err(CaptureError::CaptureUnavailable("target region is empty".into()));
    }
    Ok(imageops::crop_imm(frame.image(), px.x, px.y, px.width, px.height).to_image())
}

/// Encode an RGB image. Empty encoder output counts as a failure.
pub fn encode(image: &RgbImage, format: EncodeFormat) -> Result<Vec<u8>, CaptureError> {
    let mut data = Vec::new();
    match format {
        EncodeFormat::Jpeg { quality } => {
            JpegEncoder::new_with_quality(&mut data, quality)
                .encode_image(image)
                .map_err(|e| CaptureError::EncodeFailure(e.to_string()))?;
        }
        EncodeFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                .map_err(|e| CaptureError::EncodeFailure(e.to_string()))?;
        }
    }
    if data.is_empty() {
        return Err(CaptureError::EncodeFailure("encoder produced no data".into()));
    }
    Ok(data)
}

/// Crop + encode the target region of the raw frame.
pub fn capture_target(
    frame: &VideoFrame,
    region: &TargetRegion,
    format: EncodeFormat,
    trigger: CaptureTrigger,
) -> Result<CapturedImage, CaptureError> {
    let cropped = crop_region(frame, region)?;
    let data = encode(&cropped, format)?;
    tracing::debug!(
        sequence = frame.sequence,
        width = cropped.width(),
        height = cropped.height(),
        bytes = data.len(),
        %format,
        "target region encoded"
    );
    Ok(CapturedImage {
        data,
        format,
        width: cropped.width(),
        height: cropped.height(),
        trigger,
        captured_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayCanvas;
    use facegate_core::{BoundingBox, CanvasSize, DetectionFrame, FaceObservation};
    use image::Rgb;

    /// Every pixel distinct enough to catch off-by-one crops.
    fn gradient_frame(width: u32, height: u32) -> VideoFrame {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 251) as u8])
        });
        VideoFrame::new(image, 1)
    }

    #[test]
    fn test_region_pixels_default_region() {
        let px = region_pixels(&TargetRegion::default(), 640, 480).unwrap();
        assert_eq!(
            px,
            PixelRect {
                x: 160,
                y: 60,
                width: 320,
                height: 360
            }
        );
    }

    #[test]
    fn test_region_pixels_scaled_frame() {
        let px = region_pixels(&TargetRegion::default(), 1280, 960).unwrap();
        assert_eq!((px.x, px.y, px.width, px.height), (320, 120, 640, 720));
    }

    #[test]
    fn test_region_out_of_bounds() {
        let region = TargetRegion::new(
            CanvasSize::default(),
            BoundingBox::new(500.0, 100.0, 200.0, 100.0),
        );
        let err = region_pixels(&region, 640, 480).unwrap_err();
        assert_eq!(
            err,
            CaptureError::RegionOutOfBounds {
                x: 500,
                y: 100,
                width: 200,
                height: 100,
                frame_width: 640,
                frame_height: 480
            }
        );
    }

    #[test]
    fn test_crop_not_ready_frame() {
        let frame = VideoFrame::not_ready(640, 480);
        let err = crop_region(&frame, &TargetRegion::default()).unwrap_err();
        assert!(matches!(err, CaptureError::CaptureUnavailable(_)));
    }

    #[test]
    fn test_crop_zero_sized_frame() {
        let frame = VideoFrame::new(RgbImage::new(0, 0), 0);
        let err = crop_region(&frame, &TargetRegion::default()).unwrap_err();
        assert!(matches!(err, CaptureError::CaptureUnavailable(_)));
    }

    #[test]
    fn test_png_capture_matches_raw_pixels_not_overlay() {
        let frame = gradient_frame(640, 480);
        let region = TargetRegion::default();
        let detections = DetectionFrame::new(
            640,
            480,
            vec![FaceObservation {
                bbox: BoundingBox::new(220.0, 120.0, 200.0, 240.0),
                confidence: 0.9,
                is_facing_camera: true,
                yaw: 0.0,
                pitch: 0.0,
                roll: 0.0,
                frontal_confidence: 0.9,
            }],
        );
        let overlay = OverlayCanvas::compose(&frame, &region, &detections, true);

        let captured =
            capture_target(&frame, &region, EncodeFormat::Png, CaptureTrigger::Automatic).unwrap();
        assert_eq!((captured.width, captured.height), (320, 360));

        let decoded = image::load_from_memory_with_format(&captured.data, ImageFormat::Png)
            .unwrap()
            .to_rgb8();
        let raw_crop = imageops::crop_imm(frame.image(), 160, 60, 320, 360).to_image();
        let overlay_crop = imageops::crop_imm(overlay.image(), 160, 60, 320, 360).to_image();

        assert_eq!(decoded, raw_crop);
        assert_ne!(decoded, overlay_crop);
    }

    #[test]
    fn test_jpeg_capture() {
        let frame = gradient_frame(640, 480);
        let captured = capture_target(
            &frame,
            &TargetRegion::default(),
            EncodeFormat::default(),
            CaptureTrigger::Manual,
        )
        .unwrap();
        // SOI marker
        assert_eq!(&captured.data[..2], &[0xFF, 0xD8]);
        assert_eq!(captured.trigger, CaptureTrigger::Manual);
        let decoded = image::load_from_memory(&captured.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 360));
    }

    #[test]
    fn test_encode_format_parse() {
        assert_eq!("png".parse::<EncodeFormat>().unwrap(), EncodeFormat::Png);
        assert_eq!("JPG".parse::<EncodeFormat>().unwrap(), EncodeFormat::default());
        assert_eq!(
            "jpeg:75".parse::<EncodeFormat>().unwrap(),
            EncodeFormat::Jpeg { quality: 75 }
        );
        assert!("jpeg:0".parse::<EncodeFormat>().is_err());
        assert!("jpeg:abc".parse::<EncodeFormat>().is_err());
        assert!("gif".parse::<EncodeFormat>().is_err());
        assert!("png:9".parse::<EncodeFormat>().is_err());
    }

    #[test]
    fn test_encode_format_extension() {
        assert_eq!(EncodeFormat::Png.extension(), "png");
        assert_eq!(EncodeFormat::default().extension(), "jpg");
        assert_eq!(EncodeFormat::Png.to_string(), "png");
    }
}
