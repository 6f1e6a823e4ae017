//! Hand gesture recognition module
//!
//! Turns 21-point hand keypoint sets into finger bend angles and gesture labels.

pub mod angles;
pub mod classifier;
pub mod gesture;
pub mod keypoints;

pub use angles::{finger_angles, FingerAngles};
pub use classifier::{Bend, FingerPattern, GestureClassifier};
pub use gesture::Gesture;
pub use keypoints::{HandKeypoints, Keypoint, KEYPOINT_COUNT};
