//! Head pose from facial landmarks via simple geometric ratios.
//!
//! Works on the centroids of the eye, nose and mouth point sets. The frame
//! is first de-rotated around the eye midpoint so that the eye line is
//! horizontal; yaw then comes from the horizontal nose offset and pitch from
//! where the nose sits between the eye line and the mouth.

use crate::types::Landmarks;

// --- Named constants (no magic numbers) ---
/// Nose tip depth in front of the eye plane, in inter-ocular distances.
const NOSE_DEPTH_RATIO: f32 = 0.6;
/// Nose tip height between eye line (0.0) and mouth (1.0) for a level head.
const NEUTRAL_NOSE_HEIGHT: f32 = 0.45;
/// Offset from the neutral nose height that corresponds to a 90° pitch.
const PITCH_RANGE: f32 = 0.55;
/// Inter-ocular distances below this (pixels) are treated as degenerate.
const MIN_EYE_DISTANCE: f32 = 1e-3;

/// Pose angles in degrees plus derived frontal confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseEstimate {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub frontal_confidence: f32,
    pub is_facing_camera: bool,
}

fn centroid(points: &[(f32, f32)]) -> Option<(f32, f32)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0f32, 0.0f32), |(ax, ay), &(x, y)| (ax + x, ay + y));
    Some((sx / n, sy / n))
}

/// Estimate yaw, pitch and roll from landmark point sets.
///
/// Returns `None` when a point set is empty or the eyes coincide.
pub fn estimate_pose(landmarks: &Landmarks) -> Option<PoseEstimate> {
    let left_eye = centroid(&landmarks.left_eye)?;
    let right_eye = centroid(&landmarks.right_eye)?;
    let nose = centroid(&landmarks.nose)?;
    let mouth = centroid(&landmarks.mouth)?;

    let ex = right_eye.0 - left_eye.0;
    let ey = right_eye.1 - left_eye.1;
    let eye_distance = (ex * ex + ey * ey).sqrt();
    if eye_distance < MIN_EYE_DISTANCE {
        return None;
    }

    let roll = ey.atan2(ex);
    let (sin_r, cos_r) = roll.sin_cos();
    let mid = ((left_eye.0 + right_eye.0) / 2.0, (left_eye.1 + right_eye.1) / 2.0);

    // Rotate by -roll around the eye midpoint.
    let derotate = |(px, py): (f32, f32)| -> (f32, f32) {
        let dx = px - mid.0;
        let dy = py - mid.1;
        (dx * cos_r + dy * sin_r, -dx * sin_r + dy * cos_r)
    };

    let (nose_x, nose_y) = derotate(nose);
    let (_, mouth_y) = derotate(mouth);
    if mouth_y <= MIN_EYE_DISTANCE {
        // Mouth at or above the eye line: not a plausible upright face.
        return None;
    }

    let yaw_ratio = (nose_x / eye_distance / NOSE_DEPTH_RATIO).clamp(-1.0, 1.0);
    let yaw = yaw_ratio.asin();

    let nose_height = nose_y / mouth_y;
    let pitch_ratio = ((nose_height - NEUTRAL_NOSE_HEIGHT) / PITCH_RANGE).clamp(-1.0, 1.0);
    let pitch = pitch_ratio.asin();

    let frontal_confidence = (yaw.cos() * pitch.cos()).clamp(0.0, 1.0);
    let is_facing_camera = nose_x.abs() < eye_distance / 2.0 && nose_y > 0.0;

    Some(PoseEstimate {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
        frontal_confidence,
        is_facing_camera,
    })
}
