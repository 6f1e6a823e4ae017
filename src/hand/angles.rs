//! Per-finger bend angles using the dot product
//!
//! Each finger is measured as the angle between a proximal vector (wrist to
//! the PIP joint) and a distal vector (DIP joint to tip). A straight finger
//! keeps both vectors pointing the same way, so small angles mean "extended".

use super::keypoints::{
    HandKeypoints, INDEX_DIP, INDEX_PIP, INDEX_TIP, MIDDLE_DIP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_DIP, PINKY_PIP, PINKY_TIP, RING_DIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_MCP,
    THUMB_TIP, WRIST,
};

/// Angle reported when a segment has no length
pub const DEGENERATE_ANGLE: f32 = 180.0;

/// (proximal joint, distal base, tip) for each finger, thumb to pinky
const FINGER_SEGMENTS: [(usize, usize, usize); 5] = [
    (THUMB_MCP, THUMB_IP, THUMB_TIP),
    (INDEX_PIP, INDEX_DIP, INDEX_TIP),
    (MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP),
    (RING_PIP, RING_DIP, RING_TIP),
    (PINKY_PIP, PINKY_DIP, PINKY_TIP),
];

/// Bend angle of each finger in degrees, thumb first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerAngles(pub [f32; 5]);

/// Angle between two 2D vectors in degrees
///
/// Uses `cos(θ) = (v1 · v2) / (|v1| × |v2|)`. Returns [`DEGENERATE_ANGLE`] when
/// either vector is zero-length, i.e. when the cosine is not finite.
pub fn vector_angle(v1: (f32, f32), v2: (f32, f32)) -> f32 {
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    let cos_angle = dot / (mag1 * mag2);
    if !cos_angle.is_finite() {
        return DEGENERATE_ANGLE;
    }

    // Rounding can push parallel vectors a hair past ±1
    cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Compute the five finger bend angles for a hand
pub fn finger_angles(hand: &HandKeypoints) -> FingerAngles {
    let wrist = hand.get(WRIST);
    let mut angles = [DEGENERATE_ANGLE; 5];

    for (angle, &(joint, base, tip)) in angles.iter_mut().zip(FINGER_SEGMENTS.iter()) {
        let joint = hand.get(joint);
        let base = hand.get(base);
        let tip = hand.get(tip);

        let proximal = (wrist.x as f32 - joint.x as f32, wrist.y as f32 - joint.y as f32);
        let distal = (base.x as f32 - tip.x as f32, base.y as f32 - tip.y as f32);
        *angle = vector_angle(proximal, distal);
    }

    FingerAngles(angles)
}
