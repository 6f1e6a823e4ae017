//! Hand keypoint layout and pixel-space keypoint sets

use serde::{Deserialize, Serialize};

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Number of keypoints the hand detector reports per hand
pub const KEYPOINT_COUNT: usize = 21;

/// Scaled coordinates are held within `±MAX_COORD` so that differences,
/// midpoints and padding stay inside `i32`
pub const MAX_COORD: i32 = 1 << 24;

/// A single keypoint in pixel coordinates (y grows downward)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: i32,
    pub y: i32,
}

impl Keypoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The 21 keypoints of one detected hand
///
/// A value of this type always holds exactly [`KEYPOINT_COUNT`] points; a hand
/// that was not detected has no `HandKeypoints` at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandKeypoints {
    points: [Keypoint; KEYPOINT_COUNT],
}

impl HandKeypoints {
    /// Build from pixel-space points. Returns `None` unless exactly 21 points are given.
    ///
    /// Coordinates are pinned to `±`[`MAX_COORD`].
    pub fn new(points: &[Keypoint]) -> Option<Self> {
        let points: [Keypoint; KEYPOINT_COUNT] = points.try_into().ok()?;
        let pin = |v: i32| v.clamp(-MAX_COORD, MAX_COORD);
        Some(Self {
            points: points.map(|p| Keypoint::new(pin(p.x), pin(p.y))),
        })
    }

    /// Build from detector output normalized to 0..1, scaling into a `width` x `height` frame.
    ///
    /// Scaled coordinates are truncated toward zero, matching how the detector
    /// output is turned into pixel indices. Points far off-frame are pinned to
    /// [`MAX_COORD`]; a non-finite coordinate rejects the whole hand.
    pub fn from_normalized(points: &[[f32; 2]], width: u32, height: u32) -> Option<Self> {
        if points.len() != KEYPOINT_COUNT {
            return None;
        }
        let scaled = points
            .iter()
            .map(|&[x, y]| Some(Keypoint::new(scale(x, width)?, scale(y, height)?)))
            .collect::<Option<Vec<Keypoint>>>()?;
        Self::new(&scaled)
    }

    /// Get a keypoint by layout index (see the `*_TIP`/`*_MCP` constants)
    pub fn get(&self, index: usize) -> Keypoint {
        self.points[index]
    }

    pub fn points(&self) -> &[Keypoint; KEYPOINT_COUNT] {
        &self.points
    }

    /// Vertical extent of the hand, `max(y) - min(y)`
    pub fn height(&self) -> i32 {
        let (min, max) = self
            .points
            .iter()
            .fold((i32::MAX, i32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        max - min
    }

    /// Axis-aligned extent as `(x_min, y_min, x_max, y_max)`
    pub fn extent(&self) -> (i32, i32, i32, i32) {
        self.points.iter().fold(
            (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }
}

/// Scale a normalized coordinate to pixels; the cast saturates and `new` pins the rest
fn scale(v: f32, extent: u32) -> Option<i32> {
    v.is_finite().then(|| (v as f64 * extent as f64) as i32)
}
