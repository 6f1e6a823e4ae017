//! Masked hand region computation and frame-to-frame smoothing

use serde::{Deserialize, Serialize};

use crate::config::RegionConfig;
use crate::hand::HandKeypoints;

/// Axis-aligned pixel rectangle, `max` edges exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Tight box around a hand's keypoints
    pub fn around(hand: &HandKeypoints) -> Self {
        let (x_min, y_min, x_max, y_max) = hand.extent();
        Self::new(x_min, y_min, x_max, y_max)
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// Whether the box covers any pixels
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Restrict to a `width` x `height` frame
    pub fn clamp_to(&self, width: i32, height: i32) -> Self {
        Self::new(
            self.x_min.max(0),
            self.y_min.max(0),
            self.x_max.min(width),
            self.y_max.min(height),
        )
    }

    /// Component-wise `self * alpha + other * (1 - alpha)`, truncated
    fn blend(&self, other: &Self, alpha: f64) -> Self {
        let mix = |a: i32, b: i32| (a as f64 * alpha + b as f64 * (1.0 - alpha)) as i32;
        Self::new(
            mix(self.x_min, other.x_min),
            mix(self.y_min, other.y_min),
            mix(self.x_max, other.x_max),
            mix(self.y_max, other.y_max),
        )
    }
}

/// Pads, size-guards and smooths the region masked over a hand
///
/// One smoother is shared by every masked hand in the stream, so with two
/// masked hands in a frame the region of the second is blended with the first.
#[derive(Debug, Clone)]
pub struct RegionSmoother {
    config: RegionConfig,
    previous: Option<BoundingBox>,
    missed: u32,
}

impl RegionSmoother {
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            config: config.clone(),
            previous: None,
            missed: 0,
        }
    }

    /// Region to mask for `hand` in a `frame_w` x `frame_h` frame
    pub fn update(&mut self, hand: &HandKeypoints, frame_w: i32, frame_h: i32) -> BoundingBox {
        let current = self.expand(BoundingBox::around(hand), frame_w, frame_h);

        let smoothed = match self.previous {
            Some(prev) => prev.blend(&current, self.config.smooth_alpha as f64),
            None => current,
        };

        self.previous = Some(smoothed);
        self.missed = 0;
        smoothed
    }

    /// Note a frame in which nothing was masked
    ///
    /// After `max_missed_frames` such frames in a row the previous region is
    /// dropped, so a hand appearing elsewhere later is not dragged from the old spot.
    pub fn miss(&mut self) {
        if self.previous.is_none() {
            return;
        }
        self.missed += 1;
        if self.missed >= self.config.max_missed_frames {
            tracing::debug!("Masked region unused for {} frames, discarding", self.missed);
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.missed = 0;
    }

    /// Last region produced, if still held
    pub fn previous(&self) -> Option<BoundingBox> {
        self.previous
    }

    /// Pad the raw box, enforce the minimum size and keep it inside the frame
    fn expand(&self, raw: BoundingBox, frame_w: i32, frame_h: i32) -> BoundingBox {
        let side = raw.width().max(raw.height());
        let pad = (side as f64 * self.config.padding_ratio as f64) as i32 + self.config.extra_padding;

        let mut b = BoundingBox::new(
            raw.x_min - pad,
            raw.y_min - pad,
            raw.x_max + pad,
            raw.y_max + pad,
        )
        .clamp_to(frame_w, frame_h);

        let min_dim = self.config.min_dimension;
        let half = min_dim / 2;
        if b.width() < min_dim {
            let cx = (b.x_min + b.x_max).div_euclid(2);
            b.x_min = cx - half;
            b.x_max = cx + half;
        }
        if b.height() < min_dim {
            let cy = (b.y_min + b.y_max).div_euclid(2);
            b.y_min = cy - half;
            b.y_max = cy + half;
        }

        b.clamp_to(frame_w, frame_h)
    }
}
