//! Target region: the fixed rectangle a face must fit inside.

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CANVAS_WIDTH: u32 = 640;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 480;
pub const DEFAULT_REGION_WIDTH_FRACTION: f32 = 0.5;
pub const DEFAULT_REGION_HEIGHT_FRACTION: f32 = 0.75;

/// Logical canvas the target region is laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

/// Rectangle in logical canvas coordinates. Built once per session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRegion {
    canvas: CanvasSize,
    rect: BoundingBox,
}

impl TargetRegion {
    pub fn new(canvas: CanvasSize, rect: BoundingBox) -> Self {
        Self { canvas, rect }
    }

    /// Region centred on the canvas, sized as a fraction of each canvas axis.
    pub fn centered(canvas: CanvasSize, width_fraction: f32, height_fraction: f32) -> Self {
        let w = canvas.width as f32 * width_fraction.clamp(0.0, 1.0);
        let h = canvas.height as f32 * height_fraction.clamp(0.0, 1.0);
        let x = (canvas.width as f32 - w) / 2.0;
        let y = (canvas.height as f32 - h) / 2.0;
        Self::new(canvas, BoundingBox::new(x, y, w, h))
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// The region in canvas coordinates.
    pub fn rect(&self) -> BoundingBox {
        self.rect
    }

    /// Map the region into a frame of `width` × `height` pixels.
    ///
    /// Each axis is scaled independently, matching a video stretched onto
    /// the canvas.
    pub fn scaled_to(&self, width: u32, height: u32) -> BoundingBox {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        }
        let sx = width as f32 / self.canvas.width as f32;
        let sy = height as f32 / self.canvas.height as f32;
        BoundingBox::new(
            self.rect.x * sx,
            self.rect.y * sy,
            self.rect.width * sx,
            self.rect.height * sy,
        )
    }
}

impl Default for TargetRegion {
    fn default() -> Self {
        Self::centered(
            CanvasSize::default(),
            DEFAULT_REGION_WIDTH_FRACTION,
            DEFAULT_REGION_HEIGHT_FRACTION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_region_is_centered() {
        let region = TargetRegion::default();
        let r = region.rect();
        assert_relative_eq!(r.x, 160.0);
        assert_relative_eq!(r.y, 60.0);
        assert_relative_eq!(r.width, 320.0);
        assert_relative_eq!(r.height, 360.0);
    }

    #[test]
    fn test_scaled_to_same_size_is_identity() {
        let region = TargetRegion::default();
        assert_eq!(region.scaled_to(640, 480), region.rect());
    }

    #[test]
    fn test_scaled_to_double_resolution() {
        let region = TargetRegion::default();
        let r = region.scaled_to(1280, 960);
        assert_relative_eq!(r.x, 320.0);
        assert_relative_eq!(r.y, 120.0);
        assert_relative_eq!(r.width, 640.0);
        assert_relative_eq!(r.height, 720.0);
    }

    #[test]
    fn test_scaled_to_non_uniform() {
        let region = TargetRegion::default();
        let r = region.scaled_to(1280, 720);
        assert_relative_eq!(r.x, 320.0);
        assert_relative_eq!(r.y, 90.0);
        assert_relative_eq!(r.height, 540.0);
    }

    #[test]
    fn test_zero_canvas_scales_to_empty() {
        let region = TargetRegion::new(
            CanvasSize { width: 0, height: 0 },
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        );
        assert_eq!(region.scaled_to(640, 480).area(), 0.0);
    }
}
