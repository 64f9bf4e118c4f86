//! Per-frame alignment check.
//!
//! A face is aligned when it sits fully inside the target region, faces the
//! camera, is detected confidently, has a plausible size relative to the
//! region and is within the yaw/pitch limits. A frame is aligned when at
//! least one of its faces is.

use crate::config::AlignmentConfig;
use crate::region::TargetRegion;
use crate::types::{BoundingBox, DetectionFrame, FaceObservation};

/// First criterion a face failed, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutsideRegion,
    NotFacingCamera,
    LowFrontalConfidence,
    LowConfidence,
    TooSmall,
    TooLarge,
    PoseOutOfRange,
}

impl Rejection {
    /// Short user-facing hint.
    pub fn hint(&self) -> &'static str {
        match self {
            Rejection::OutsideRegion => "Move your face inside the frame",
            Rejection::NotFacingCamera | Rejection::LowFrontalConfidence => {
                "Look straight at the camera"
            }
            Rejection::LowConfidence => "Face not clearly visible",
            Rejection::TooSmall => "Move closer",
            Rejection::TooLarge => "Move back",
            Rejection::PoseOutOfRange => "Keep your head level",
        }
    }
}

/// Outcome of evaluating one detection frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentCheck {
    pub aligned: bool,
    pub valid_faces: usize,
    /// One entry per rejected face, in detection order.
    pub rejections: Vec<Rejection>,
}

impl AlignmentCheck {
    /// Most useful hint for an unaligned frame, if any face was seen.
    pub fn hint(&self) -> Option<&'static str> {
        if self.aligned {
            return None;
        }
        self.rejections.first().map(Rejection::hint)
    }
}

/// Check one face against the region (already scaled to frame pixels).
pub fn check_face(
    face: &FaceObservation,
    region: &BoundingBox,
    config: &AlignmentConfig,
) -> Result<(), Rejection> {
    if !region.contains(&face.bbox) {
        return Err(Rejection::OutsideRegion);
    }
    if !face.is_facing_camera {
        return Err(Rejection::NotFacingCamera);
    }
    // Each criterion is stated as the condition a valid face meets, so NaN
    // inputs fail it.
    let frontal = face.frontal_confidence >= config.min_frontal_confidence;
    if !frontal {
        return Err(Rejection::LowFrontalConfidence);
    }
    let confident = face.confidence >= config.min_detection_confidence;
    if !confident {
        return Err(Rejection::LowConfidence);
    }

    let region_area = region.area();
    if region_area <= 0.0 {
        return Err(Rejection::OutsideRegion);
    }
    let ratio = face.bbox.area() / region_area;
    let large_enough = ratio >= config.min_size_ratio;
    if !large_enough {
        return Err(Rejection::TooSmall);
    }
    let small_enough = ratio <= config.max_size_ratio;
    if !small_enough {
        return Err(Rejection::TooLarge);
    }

    let pose_ok =
        face.yaw.abs() <= config.max_yaw_deg && face.pitch.abs() <= config.max_pitch_deg;
    if !pose_ok {
        return Err(Rejection::PoseOutOfRange);
    }
    Ok(())
}

/// Evaluate every face in a frame. Only whether some face is valid matters;
/// faces carry no identity across frames.
pub fn evaluate(
    frame: &DetectionFrame,
    region: &TargetRegion,
    config: &AlignmentConfig,
) -> AlignmentCheck {
    let region_px = region.scaled_to(frame.width, frame.height);
    let mut check = AlignmentCheck::default();

    for face in &frame.faces {
        match check_face(face, &region_px, config) {
            Ok(()) => check.valid_faces += 1,
            Err(rejection) => check.rejections.push(rejection),
        }
    }
    check.aligned = check.valid_faces > 0;

    tracing::debug!(
        faces = frame.faces.len(),
        valid = check.valid_faces,
        rejections = ?check.rejections,
        "alignment evaluated"
    );
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::CanvasSize;

    fn good_face() -> FaceObservation {
        // Default region on a 640x480 frame is (160, 60) 320x360, area 115200.
        FaceObservation {
            bbox: BoundingBox::new(220.0, 120.0, 200.0, 240.0),
            confidence: 0.95,
            is_facing_camera: true,
            yaw: 2.0,
            pitch: -3.0,
            roll: 1.0,
            frontal_confidence: 0.97,
        }
    }

    fn frame(faces: Vec<FaceObservation>) -> DetectionFrame {
        DetectionFrame::new(640, 480, faces)
    }

    fn check(face: FaceObservation) -> Result<(), Rejection> {
        let region = TargetRegion::default().scaled_to(640, 480);
        check_face(&face, &region, &AlignmentConfig::default())
    }

    #[test]
    fn test_good_face_is_valid() {
        assert_eq!(check(good_face()), Ok(()));
    }

    #[test]
    fn test_partially_outside_region() {
        let mut face = good_face();
        face.bbox.x = 140.0; // left edge 20px outside the region
        assert_eq!(check(face), Err(Rejection::OutsideRegion));
    }

    #[test]
    fn test_not_facing_camera() {
        let mut face = good_face();
        face.is_facing_camera = false;
        assert_eq!(check(face), Err(Rejection::NotFacingCamera));
    }

    #[test]
    fn test_low_frontal_confidence() {
        let mut face = good_face();
        face.frontal_confidence = 0.5;
        assert_eq!(check(face), Err(Rejection::LowFrontalConfidence));
    }

    #[test]
    fn test_low_detection_confidence() {
        let mut face = good_face();
        face.confidence = 0.4;
        assert_eq!(check(face), Err(Rejection::LowConfidence));
    }

    #[test]
    fn test_confidence_at_threshold_passes() {
        let mut face = good_face();
        face.confidence = AlignmentConfig::default().min_detection_confidence;
        assert_eq!(check(face), Ok(()));
    }

    #[test]
    fn test_too_small() {
        let mut face = good_face();
        // 90x90 = 8100 / 115200 ≈ 0.07
        face.bbox = BoundingBox::new(250.0, 150.0, 90.0, 90.0);
        assert_eq!(check(face), Err(Rejection::TooSmall));
    }

    #[test]
    fn test_too_large() {
        let mut face = good_face();
        // Fills the region entirely: ratio 1.0
        face.bbox = BoundingBox::new(160.0, 60.0, 320.0, 360.0);
        assert_eq!(check(face), Err(Rejection::TooLarge));
    }

    #[test]
    fn test_yaw_out_of_range() {
        let mut face = good_face();
        face.yaw = -25.0;
        assert_eq!(check(face), Err(Rejection::PoseOutOfRange));
    }

    #[test]
    fn test_pitch_out_of_range() {
        let mut face = good_face();
        face.pitch = 21.0;
        assert_eq!(check(face), Err(Rejection::PoseOutOfRange));
    }

    #[test]
    fn test_one_valid_face_among_many_aligns_frame() {
        let mut bad = good_face();
        bad.bbox.x = 0.0;
        let result = evaluate(
            &frame(vec![bad, good_face()]),
            &TargetRegion::default(),
            &AlignmentConfig::default(),
        );
        assert!(result.aligned);
        assert_eq!(result.valid_faces, 1);
        assert_eq!(result.rejections, vec![Rejection::OutsideRegion]);
        assert_eq!(result.hint(), None);
    }

    #[test]
    fn test_empty_frame_is_not_aligned() {
        let result = evaluate(
            &frame(vec![]),
            &TargetRegion::default(),
            &AlignmentConfig::default(),
        );
        assert!(!result.aligned);
        assert_eq!(result.hint(), None);
    }

    #[test]
    fn test_region_scales_with_frame_resolution() {
        // Same face geometry at 2x resolution still fits the 2x region.
        let mut face = good_face();
        face.bbox = BoundingBox::new(440.0, 240.0, 400.0, 480.0);
        let result = evaluate(
            &DetectionFrame::new(1280, 960, vec![face]),
            &TargetRegion::default(),
            &AlignmentConfig::default(),
        );
        assert!(result.aligned);
    }

    #[test]
    fn test_zero_area_region_never_aligns() {
        let region = TargetRegion::new(
            CanvasSize::default(),
            BoundingBox::new(100.0, 100.0, 0.0, 0.0),
        );
        let result = evaluate(&frame(vec![good_face()]), &region, &AlignmentConfig::default());
        assert!(!result.aligned);
    }

    #[test]
    fn test_hint_for_unaligned_frame() {
        let mut face = good_face();
        face.yaw = 40.0;
        let result = evaluate(
            &frame(vec![face]),
            &TargetRegion::default(),
            &AlignmentConfig::default(),
        );
        assert_eq!(result.hint(), Some("Keep your head level"));
    }

    #[test]
    fn test_nan_fields_never_align() {
        let nan_confidence = FaceObservation {
            confidence: f32::NAN,
            ..good_face()
        };
        assert_eq!(check(nan_confidence), Err(Rejection::LowConfidence));

        let nan_frontal = FaceObservation {
            frontal_confidence: f32::NAN,
            ..good_face()
        };
        assert_eq!(check(nan_frontal), Err(Rejection::LowFrontalConfidence));

        let nan_yaw = FaceObservation {
            yaw: f32::NAN,
            ..good_face()
        };
        assert_eq!(check(nan_yaw), Err(Rejection::PoseOutOfRange));

        let nan_pitch = FaceObservation {
            pitch: f32::NAN,
            ..good_face()
        };
        assert_eq!(check(nan_pitch), Err(Rejection::PoseOutOfRange));

        let all_nan = FaceObservation {
            confidence: f32::NAN,
            yaw: f32::NAN,
            frontal_confidence: f32::NAN,
            ..good_face()
        };
        let result = evaluate(
            &frame(vec![all_nan]),
            &TargetRegion::default(),
            &AlignmentConfig::default(),
        );
        assert!(!result.aligned);
        assert_eq!(result.valid_faces, 0);
    }

    #[test]
    fn test_nan_bbox_never_aligns() {
        let face = FaceObservation {
            bbox: BoundingBox::new(f32::NAN, 120.0, 200.0, 240.0),
            ..good_face()
        };
        assert_eq!(check(face), Err(Rejection::OutsideRegion));
    }
}
