use crate::pose::{self, PoseEstimate};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area, clamped to zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// True when all four edges of `other` lie inside `self` (touching counts as inside).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Facial landmark point sets, in the same pixel space as the detection box.
///
/// Each set may hold one point (five-point detectors) or a contour
/// (68-point detectors); the pose estimator works on set centroids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub left_eye: Vec<(f32, f32)>,
    pub right_eye: Vec<(f32, f32)>,
    pub nose: Vec<(f32, f32)>,
    pub mouth: Vec<(f32, f32)>,
}

impl Landmarks {
    /// Build from five-point landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub fn from_five_point(points: &[(f32, f32); 5]) -> Self {
        Self {
            left_eye: vec![points[0]],
            right_eye: vec![points[1]],
            nose: vec![points[2]],
            mouth: vec![points[3], points[4]],
        }
    }
}

/// One face as delivered by the upstream detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    #[serde(default)]
    pub landmarks: Option<Landmarks>,
}

/// A detected face with the pose attributes the alignment gate checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
    pub is_facing_camera: bool,
    /// Degrees; positive = turned towards image right.
    pub yaw: f32,
    /// Degrees; positive = head tilted down.
    pub pitch: f32,
    /// Degrees; angle of the eye line against the horizontal.
    pub roll: f32,
    /// Confidence in [0, 1] that the face is frontal.
    pub frontal_confidence: f32,
}

impl FaceObservation {
    /// Derive pose attributes from the detection's landmarks.
    ///
    /// A detection without usable landmarks is kept but marked as not facing
    /// the camera, so it can never satisfy the alignment criteria.
    pub fn from_raw(raw: &RawDetection) -> Self {
        let estimate = raw.landmarks.as_ref().and_then(pose::estimate_pose);
        let PoseEstimate {
            yaw,
            pitch,
            roll,
            frontal_confidence,
            is_facing_camera,
        } = estimate.unwrap_or_default();

        Self {
            bbox: raw.bbox,
            confidence: raw.confidence,
            is_facing_camera,
            yaw,
            pitch,
            roll,
            frontal_confidence,
        }
    }
}

/// Detector output for a single video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Source frame width in pixels.
    pub width: u32,
    /// Source frame height in pixels.
    pub height: u32,
    pub faces: Vec<FaceObservation>,
}

impl DetectionFrame {
    pub fn new(width: u32, height: u32, faces: Vec<FaceObservation>) -> Self {
        Self { width, height, faces }
    }

    pub fn from_raw(width: u32, height: u32, detections: &[RawDetection]) -> Self {
        Self {
            width,
            height,
            faces: detections.iter().map(FaceObservation::from_raw).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_fully_inside() {
        let outer = BoundingBox::new(100.0, 50.0, 300.0, 300.0);
        let inner = BoundingBox::new(150.0, 100.0, 100.0, 120.0);
        assert!(outer.contains(&inner));
    }

    #[test]
    fn test_contains_touching_edges() {
        let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_contains_rejects_overlap() {
        let outer = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        // Overlaps, but the right edge sticks out by one pixel.
        let inner = BoundingBox::new(150.0, 150.0, 151.0, 50.0);
        assert!(!outer.contains(&inner));
    }

    #[test]
    fn test_area_degenerate() {
        assert_eq!(BoundingBox::new(0.0, 0.0, -5.0, 10.0).area(), 0.0);
        assert_eq!(BoundingBox::new(0.0, 0.0, 4.0, 5.0).area(), 20.0);
    }

    #[test]
    fn test_from_raw_without_landmarks_is_not_facing() {
        let raw = RawDetection {
            bbox: BoundingBox::new(10.0, 10.0, 50.0, 50.0),
            confidence: 0.99,
            landmarks: None,
        };
        let face = FaceObservation::from_raw(&raw);
        assert!(!face.is_facing_camera);
        assert_eq!(face.frontal_confidence, 0.0);
        assert_eq!(face.confidence, 0.99);
    }

    #[test]
    fn test_five_point_landmarks_split_into_sets() {
        let lms = Landmarks::from_five_point(&[
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ]);
        assert_eq!(lms.left_eye, vec![(80.0, 60.0)]);
        assert_eq!(lms.right_eye, vec![(120.0, 60.0)]);
        assert_eq!(lms.nose, vec![(100.0, 85.0)]);
        assert_eq!(lms.mouth.len(), 2);
    }

    #[test]
    fn test_raw_detection_deserializes_without_landmarks() {
        let raw: RawDetection = serde_json::from_str(
            r#"{"bbox":{"x":1.0,"y":2.0,"width":3.0,"height":4.0},"confidence":0.5}"#,
        )
        .unwrap();
        assert!(raw.landmarks.is_none());
        assert_eq!(raw.bbox.height, 4.0);
    }
}
