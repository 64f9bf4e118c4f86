//! Debug overlay: a second render target for preview graphics.

use crate::frame::VideoFrame;
use facegate_core::{BoundingBox, DetectionFrame, TargetRegion};
use image::{Rgb, RgbImage};
use std::path::Path;

const REGION_ALIGNED: Rgb<u8> = Rgb([0, 200, 0]);
const REGION_IDLE: Rgb<u8> = Rgb([220, 0, 0]);
const FACE_BOX: Rgb<u8> = Rgb([255, 210, 0]);
const LINE_WIDTH: u32 = 2;

/// Annotated copy of a video frame.
pub struct OverlayCanvas {
    image: RgbImage,
}

impl OverlayCanvas {
    /// Copy the raw frame and draw the target region and face boxes onto the copy.
    pub fn compose(
        frame: &VideoFrame,
        region: &TargetRegion,
        detections: &DetectionFrame,
        aligned: bool,
    ) -> Self {
        let mut canvas = Self {
            image: frame.image().clone(),
        };
        let (w, h) = (frame.width(), frame.height());

        let color = if aligned { REGION_ALIGNED } else { REGION_IDLE };
        canvas.draw_rect(&region.scaled_to(w, h), color);

        // Detections may come from a stream of another resolution.
        let sx = if detections.width > 0 {
            w as f32 / detections.width as f32
        } else {
            1.0
        };
        let sy = if detections.height > 0 {
            h as f32 / detections.height as f32
        } else {
            1.0
        };
        for face in &detections.faces {
            let b = face.bbox;
            canvas.draw_rect(
                &BoundingBox::new(b.x * sx, b.y * sy, b.width * sx, b.height * sy),
                FACE_BOX,
            );
        }
        canvas
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save(path)
    }

    /// Hollow rectangle, clipped to the canvas.
    fn draw_rect(&mut self, rect: &BoundingBox, color: Rgb<u8>) {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return;
        }
        let clamp_x = |v: f32| (v.round().max(0.0) as u32).min(w - 1);
        let clamp_y = |v: f32| (v.round().max(0.0) as u32).min(h - 1);
        let (x0, y0) = (clamp_x(rect.x), clamp_y(rect.y));
        let (x1, y1) = (clamp_x(rect.right()), clamp_y(rect.bottom()));

        for t in 0..LINE_WIDTH {
            for x in x0..=x1 {
                self.image.put_pixel(x, (y0 + t).min(h - 1), color);
                self.image.put_pixel(x, y1.saturating_sub(t), color);
            }
            for y in y0..=y1 {
                self.image.put_pixel((x0 + t).min(w - 1), y, color);
                self.image.put_pixel(x1.saturating_sub(t), y, color);
            }
        }
    }
}
