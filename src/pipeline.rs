//! Per-frame guard pipeline
//!
//! Wires classification, debouncing, escalation and region smoothing into a
//! single call per video frame. The pipeline owns all of its state; callers
//! sharing one across threads must wrap it in a mutex.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, MosaicConfig};
use crate::guard::{
    Debouncer, EscalationTracker, JsonFileStore, PenaltyLevel, RegionSmoother, Statistics,
};
use crate::hand::keypoints::MAX_COORD;
use crate::hand::{Gesture, GestureClassifier, HandKeypoints};
use crate::mosaic::MosaicRegion;

/// What to do with one detected hand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandDecision {
    /// Recognized gesture, `None` when no rule matched
    pub gesture: Option<Gesture>,
    /// Whether the hand must be pixelated this frame
    pub mosaic: bool,
    /// Smoothed region and grid to pixelate, present when `mosaic` is set
    pub region: Option<MosaicRegion>,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDecision {
    /// Per hand, in detection order
    pub hands: Vec<HandDecision>,
    /// Gesture counted against the user this frame
    pub confirmed: Option<Gesture>,
    pub penalty_level: PenaltyLevel,
    /// The penalty level moved this frame
    pub level_changed: bool,
    /// Confirmed disallowed gestures today
    pub disallowed_count: u32,
    pub face_mosaic_enabled: bool,
    /// Faces to pixelate; empty unless face masking is enabled
    pub face_regions: Vec<MosaicRegion>,
    /// The whole frame must be replaced with a paused screen
    pub blackout: bool,
    /// Play the warning sound
    pub alert: bool,
}

/// Frame-by-frame gesture guard
#[derive(Debug)]
pub struct GuardPipeline {
    classifier: GestureClassifier,
    debouncer: Debouncer,
    tracker: EscalationTracker,
    smoother: RegionSmoother,
    mosaic: MosaicConfig,
    blackout: bool,
}

impl GuardPipeline {
    /// Create a pipeline around an existing escalation tracker
    pub fn new(config: &Config, tracker: EscalationTracker) -> Self {
        let blackout = tracker.penalty_level() == PenaltyLevel::Shutdown;
        if blackout {
            warn!("Today's record is already at shutdown, stream stays paused");
        }

        Self {
            classifier: GestureClassifier::new(&config.classifier),
            debouncer: Debouncer::new(&config.debounce),
            tracker,
            smoother: RegionSmoother::new(&config.region),
            mosaic: config.mosaic.clone(),
            blackout,
        }
    }

    /// Create a pipeline persisting to `config.escalation.state_file`
    pub fn from_config(config: &Config) -> Self {
        let store = JsonFileStore::new(&config.escalation.state_file);
        let tracker = EscalationTracker::new(config.escalation.threshold, Box::new(store));
        Self::new(config, tracker)
    }

    /// Process one frame's detections
    ///
    /// `hands` are pixel-space keypoint sets in detection order and `faces` are
    /// `[x, y, w, h]` boxes, both for a `width` x `height` frame.
    pub fn process_frame(
        &mut self,
        hands: &[HandKeypoints],
        faces: &[[i32; 4]],
        width: u32,
        height: u32,
    ) -> FrameDecision {
        if self.blackout {
            return self.blackout_decision();
        }

        let frame_w = width.min(MAX_COORD as u32) as i32;
        let frame_h = height.min(MAX_COORD as u32) as i32;

        let labels: Vec<Option<Gesture>> = hands.iter().map(|h| self.classifier.classify(h)).collect();

        let confirmed = self.debouncer.update(&labels);
        let mut level_changed = false;
        let mut alert = false;
        if let Some(gesture) = confirmed {
            let outcome = self.tracker.record(gesture);
            level_changed = outcome.level_changed;
            alert = outcome.level_changed && outcome.penalty_level == PenaltyLevel::HighWarning;
            if alert {
                warn!("High warning: face masking enabled");
            }
        }

        let mut decisions = Vec::with_capacity(hands.len());
        for (hand, &gesture) in hands.iter().zip(&labels) {
            let mosaic = self.debouncer.should_mask(gesture);
            let region = if mosaic {
                let bounds = self.smoother.update(hand, frame_w, frame_h);
                self.mosaic.hand_region(bounds)
            } else {
                None
            };
            decisions.push(HandDecision {
                gesture,
                mosaic,
                region,
            });
        }

        if !decisions.iter().any(|d| d.mosaic) {
            self.smoother.miss();
        }

        let face_mosaic_enabled = self.tracker.face_mosaic_enabled();
        let face_regions = if face_mosaic_enabled {
            faces
                .iter()
                .filter_map(|&face| self.mosaic.face_region(face, frame_w, frame_h))
                .collect()
        } else {
            Vec::new()
        };

        let penalty_level = self.tracker.statistics().penalty_level;
        if penalty_level == PenaltyLevel::Shutdown {
            warn!("Penalty level reached shutdown, pausing stream");
            self.blackout = true;
        }

        debug!(
            "Frame: {} hands, labels {:?}, streak {:?} x{}",
            hands.len(),
            labels,
            self.debouncer.tracked(),
            self.debouncer.count()
        );

        FrameDecision {
            hands: decisions,
            confirmed,
            penalty_level,
            level_changed,
            disallowed_count: self.tracker.disallowed_count(),
            face_mosaic_enabled,
            face_regions,
            blackout: self.blackout,
            alert,
        }
    }

    fn blackout_decision(&self) -> FrameDecision {
        FrameDecision {
            hands: Vec::new(),
            confirmed: None,
            penalty_level: self.tracker.penalty_level(),
            level_changed: false,
            disallowed_count: self.tracker.disallowed_count(),
            face_mosaic_enabled: self.tracker.face_mosaic_enabled(),
            face_regions: Vec::new(),
            blackout: true,
            alert: false,
        }
    }

    /// Clear the day's record and every in-flight streak, lifting a blackout
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.debouncer.clear();
        self.smoother.reset();
        self.blackout = false;
    }

    /// End the session, optionally clearing the day's record first
    pub fn shutdown_session(&mut self, reset: bool) -> Statistics {
        if reset {
            self.reset();
        }
        let stats = self.tracker.statistics();
        info!(
            "Session ended: {} disallowed gestures today, penalty {}",
            stats.disallowed_count, stats.penalty_level
        );
        stats
    }

    pub fn statistics(&mut self) -> Statistics {
        self.tracker.statistics()
    }

    pub fn is_blackout(&self) -> bool {
        self.blackout
    }

    pub fn tracker(&self) -> &EscalationTracker {
        &self.tracker
    }

    pub fn region_smoother(&self) -> &RegionSmoother {
        &self.smoother
    }
}
