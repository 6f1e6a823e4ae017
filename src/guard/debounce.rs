//! Multi-frame confirmation of disallowed gestures
//!
//! A single-frame misclassification must not count against the user, so a
//! disallowed gesture has to be held for several consecutive frames before it
//! is masked, and each unbroken streak is counted at most once.

use tracing::debug;

use crate::config::DebounceConfig;
use crate::hand::Gesture;

/// Tracks the current run of a disallowed gesture across frames
#[derive(Debug, Clone)]
pub struct Debouncer {
    frames: u32,
    disallowed: Vec<Gesture>,
    tracked: Option<Gesture>,
    count: u32,
    logged: bool,
}

impl Debouncer {
    pub fn new(config: &DebounceConfig) -> Self {
        Self {
            frames: config.frames,
            disallowed: config.disallowed.clone(),
            tracked: None,
            count: 0,
            logged: false,
        }
    }

    /// Whether a label belongs to the disallowed set
    pub fn is_disallowed(&self, gesture: Gesture) -> bool {
        self.disallowed.contains(&gesture)
    }

    /// Feed one frame's labels, one per detected hand in detection order.
    ///
    /// Returns the gesture to record when its streak has just reached the
    /// confirmation threshold. A streak is confirmed once; the next
    /// confirmation needs the streak to break first.
    pub fn update(&mut self, labels: &[Option<Gesture>]) -> Option<Gesture> {
        let Some(candidate) = self.candidate(labels) else {
            self.clear();
            return None;
        };

        if self.tracked == Some(candidate) {
            self.count += 1;
        } else {
            self.tracked = Some(candidate);
            self.count = 1;
            self.logged = false;
        }

        if self.count >= self.frames && !self.logged {
            self.logged = true;
            debug!("{} held for {} frames, confirmed", candidate, self.count);
            return Some(candidate);
        }

        None
    }

    /// Whether a hand showing `label` should be masked this frame
    pub fn should_mask(&self, label: Option<Gesture>) -> bool {
        match label {
            Some(gesture) => {
                self.is_disallowed(gesture)
                    && self.tracked == Some(gesture)
                    && self.count >= self.frames
            }
            None => false,
        }
    }

    /// Most frequent disallowed label; ties go to whichever reached the top count first
    fn candidate(&self, labels: &[Option<Gesture>]) -> Option<Gesture> {
        let mut counts: Vec<(Gesture, u32)> = Vec::new();
        let mut best: Option<(Gesture, u32)> = None;

        for gesture in labels.iter().flatten().copied() {
            if !self.is_disallowed(gesture) {
                continue;
            }
            let n = match counts.iter_mut().find(|(g, _)| *g == gesture) {
                Some((_, n)) => {
                    *n += 1;
                    *n
                }
                None => {
                    counts.push((gesture, 1));
                    1
                }
            };
            if best.map_or(true, |(_, top)| n > top) {
                best = Some((gesture, n));
            }
        }

        best.map(|(gesture, _)| gesture)
    }

    /// Drop the current streak
    pub fn clear(&mut self) {
        self.tracked = None;
        self.count = 0;
        self.logged = false;
    }

    /// Gesture whose streak is being tracked
    pub fn tracked(&self) -> Option<Gesture> {
        self.tracked
    }

    /// Length of the current streak in frames
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the current streak has already been confirmed
    pub fn is_logged(&self) -> bool {
        self.logged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer {
        Debouncer::new(&DebounceConfig::default())
    }

    #[test]
    fn test_confirms_once_at_threshold() {
        let mut d = debouncer();
        let frame = [Some(Gesture::Bad)];

        assert_eq!(d.update(&frame), None);
        assert!(!d.should_mask(Some(Gesture::Bad)));
        assert_eq!(d.update(&frame), None);
        assert_eq!(d.update(&frame), Some(Gesture::Bad));
        assert!(d.should_mask(Some(Gesture::Bad)));
        assert!(d.is_logged());

        for _ in 0..10 {
            assert_eq!(d.update(&frame), None);
        }
        assert_eq!(d.count(), 13);
        assert!(d.should_mask(Some(Gesture::Bad)));
    }

    #[test]
    fn test_streak_break_rearms() {
        let mut d = debouncer();
        let bad = [Some(Gesture::Bad)];
        for _ in 0..3 {
            d.update(&bad);
        }

        d.update(&[None]);
        assert_eq!(d.tracked(), None);
        assert_eq!(d.count(), 0);
        assert!(!d.is_logged());

        assert_eq!(d.update(&bad), None);
        assert_eq!(d.update(&bad), None);
        assert_eq!(d.update(&bad), Some(Gesture::Bad));
    }

    #[test]
    fn test_switching_gesture_restarts_count() {
        let mut d = debouncer();
        d.update(&[Some(Gesture::Bad)]);
        d.update(&[Some(Gesture::Bad)]);
        d.update(&[Some(Gesture::No)]);
        assert_eq!(d.tracked(), Some(Gesture::No));
        assert_eq!(d.count(), 1);
        assert!(!d.should_mask(Some(Gesture::Bad)));
    }

    #[test]
    fn test_allowed_gestures_break_streak() {
        let mut d = debouncer();
        d.update(&[Some(Gesture::Bad)]);
        d.update(&[Some(Gesture::Good)]);
        assert_eq!(d.tracked(), None);
        assert!(!d.should_mask(Some(Gesture::Good)));
    }

    #[test]
    fn test_no_hands_breaks_streak() {
        let mut d = debouncer();
        d.update(&[Some(Gesture::Bad)]);
        d.update(&[]);
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn test_candidate_prefers_majority_then_first() {
        let d = debouncer();
        assert_eq!(
            d.candidate(&[Some(Gesture::No), Some(Gesture::Bad), Some(Gesture::Bad)]),
            Some(Gesture::Bad)
        );
        assert_eq!(
            d.candidate(&[Some(Gesture::Ok), Some(Gesture::No)]),
            Some(Gesture::Ok)
        );
        assert_eq!(
            d.candidate(&[Some(Gesture::Fist), None, Some(Gesture::No)]),
            Some(Gesture::No)
        );
        assert_eq!(d.candidate(&[Some(Gesture::Rock), None]), None);
    }

    #[test]
    fn test_two_hands_mask_only_tracked() {
        let mut d = debouncer();
        let frame = [Some(Gesture::Bad), Some(Gesture::No)];
        for _ in 0..3 {
            d.update(&frame);
        }
        assert_eq!(d.tracked(), Some(Gesture::Bad));
        assert!(d.should_mask(Some(Gesture::Bad)));
        assert!(!d.should_mask(Some(Gesture::No)));
        assert!(!d.should_mask(None));
    }

    #[test]
    fn test_single_frame_threshold() {
        let mut d = Debouncer::new(&DebounceConfig {
            frames: 1,
            ..DebounceConfig::default()
        });
        assert_eq!(d.update(&[Some(Gesture::No)]), Some(Gesture::No));
        assert_eq!(d.update(&[Some(Gesture::No)]), None);
    }
}
