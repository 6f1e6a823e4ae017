//! Pixelation plan for masked regions
//!
//! The renderer pixelates a region by downsampling it to a small grid and
//! scaling it back up. This module decides the grid for each region; the
//! actual pixel work stays with whatever draws the frame.

use serde::Serialize;

use crate::config::MosaicConfig;
use crate::guard::BoundingBox;

/// A region to pixelate and the grid to downsample it to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MosaicRegion {
    pub bounds: BoundingBox,
    /// `(columns, rows)` of the downsampled grid
    pub grid: (u32, u32),
}

impl MosaicConfig {
    /// Grid for a hand region, `side / divisor` per axis kept within `[min, max]`
    pub fn hand_grid(&self, region: &BoundingBox) -> Option<(u32, u32)> {
        if region.is_empty() {
            return None;
        }
        let axis = |side: i32| {
            (side as u32 / self.downsample_divisor.max(1))
                .clamp(self.downsample_min, self.downsample_max.max(self.downsample_min))
        };
        Some((axis(region.width()), axis(region.height())))
    }

    /// Grid for a face box; coarser faces get fewer cells, never fewer than one
    pub fn face_grid(&self, width: i32, height: i32) -> (u32, u32) {
        let level = self.face_level.max(1);
        let axis = |side: i32| (side.max(0) as u32 / level).max(1);
        (axis(width), axis(height))
    }

    pub fn hand_region(&self, bounds: BoundingBox) -> Option<MosaicRegion> {
        self.hand_grid(&bounds)
            .map(|grid| MosaicRegion { bounds, grid })
    }

    /// Face box `[x, y, w, h]` clamped to the frame, `None` if nothing is left
    pub fn face_region(&self, face: [i32; 4], frame_w: i32, frame_h: i32) -> Option<MosaicRegion> {
        let [x, y, w, h] = face;
        let bounds = BoundingBox::new(x, y, x.saturating_add(w), y.saturating_add(h))
            .clamp_to(frame_w, frame_h);
        if bounds.is_empty() {
            return None;
        }
        Some(MosaicRegion {
            bounds,
            grid: self.face_grid(bounds.width(), bounds.height()),
        })
    }
}
