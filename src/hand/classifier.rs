//! Rule-table gesture classification
//!
//! Each finger is reduced to straight/bent by comparing its bend angle with a
//! threshold, then the five-finger pattern is matched against an ordered rule
//! table. The first matching rule wins. A few gestures need the raw keypoints
//! as well: the crossed-finger "GangSign" check runs before the table, and the
//! thumbs-up/thumbs-down rule looks at which way the thumb points.

use super::angles::{finger_angles, FingerAngles};
use super::gesture::Gesture;
use super::keypoints::{
    HandKeypoints, Keypoint, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, RING_MCP, RING_TIP, THUMB_MCP,
    THUMB_TIP,
};
use crate::config::{ClassifierConfig, RuleTable};

/// Middle/ring tip gap, relative to the index/middle gap, below which the two
/// fingers count as pressed together
const TOUCH_RATIO: f32 = 0.35;

/// Thumb direction threshold used when the hand has no vertical extent
const FALLBACK_DIRECTION_PX: f32 = 10.0;

/// State of a single finger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bend {
    Straight,
    Bent,
}

const S: Bend = Bend::Straight;
const B: Bend = Bend::Bent;

/// Straight/bent state of all five fingers, thumb first
pub type FingerPattern = [Bend; 5];

/// What a matching rule produces
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Label(Gesture),
    /// Thumbs up or thumbs down, decided from the thumb's direction
    ThumbDirection,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    pattern: FingerPattern,
    outcome: Outcome,
}

const fn rule(pattern: FingerPattern, outcome: Outcome) -> Rule {
    Rule { pattern, outcome }
}

const fn label(gesture: Gesture) -> Outcome {
    Outcome::Label(gesture)
}

/// Evaluated after the GangSign check
const STANDARD_RULES: &[Rule] = &[
    rule([S, B, S, B, S], label(Gesture::ThumbMidPinky)),
    rule([S, B, B, B, B], Outcome::ThumbDirection),
    rule([B, B, S, B, B], label(Gesture::No)),
    rule([S, S, B, B, S], label(Gesture::Rock)),
    rule([B, B, B, B, B], label(Gesture::Fist)),
    rule([B, B, S, S, S], label(Gesture::Ok)),
    rule([S, B, S, S, S], label(Gesture::Ok)),
];

/// Standard gestures plus finger counting; a fist reads as zero here
const NUMERIC_RULES: &[Rule] = &[
    rule([S, B, S, B, S], label(Gesture::ThumbMidPinky)),
    rule([S, B, B, B, B], Outcome::ThumbDirection),
    rule([B, B, S, B, B], label(Gesture::No)),
    rule([S, S, B, B, S], label(Gesture::Rock)),
    rule([B, B, B, B, B], label(Gesture::Digit(0))),
    rule([B, S, B, B, B], label(Gesture::Digit(1))),
    rule([B, S, S, B, B], label(Gesture::Digit(2))),
    rule([B, B, S, S, S], label(Gesture::Ok)),
    rule([S, B, S, S, S], label(Gesture::Ok)),
    rule([B, S, S, S, B], label(Gesture::Digit(3))),
    rule([B, S, S, S, S], label(Gesture::Digit(4))),
    rule([S, S, S, S, S], label(Gesture::Digit(5))),
    rule([S, B, B, B, S], label(Gesture::Digit(6))),
    rule([S, S, B, B, B], label(Gesture::Digit(7))),
    rule([S, S, S, B, B], label(Gesture::Digit(8))),
    rule([S, S, S, S, B], label(Gesture::Digit(9))),
];

impl RuleTable {
    fn rules(&self) -> &'static [Rule] {
        match self {
            RuleTable::Standard => STANDARD_RULES,
            RuleTable::Numeric => NUMERIC_RULES,
        }
    }

    fn checks_gang_sign(&self) -> bool {
        matches!(self, RuleTable::Standard)
    }
}

/// Maps finger angles and keypoints to a gesture label
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    bend_threshold: f32,
    thumb_direction_ratio: f32,
    table: RuleTable,
}

impl GestureClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            bend_threshold: config.bend_threshold,
            thumb_direction_ratio: config.thumb_direction_ratio,
            table: config.table,
        }
    }

    /// Classify raw detector points. Anything other than 21 points yields `None`.
    pub fn classify_points(&self, points: &[Keypoint]) -> Option<Gesture> {
        HandKeypoints::new(points).and_then(|hand| self.classify(&hand))
    }

    /// Classify one hand
    pub fn classify(&self, hand: &HandKeypoints) -> Option<Gesture> {
        let angles = finger_angles(hand);
        self.classify_angles(&angles, hand)
    }

    /// Classify from precomputed angles; `hand` supplies the directional checks
    pub fn classify_angles(&self, angles: &FingerAngles, hand: &HandKeypoints) -> Option<Gesture> {
        let pattern = self.pattern(angles);

        if self.table.checks_gang_sign()
            && pattern[1] == Bend::Straight
            && pattern[4] == Bend::Straight
            && is_gang_sign(hand)
        {
            return Some(Gesture::GangSign);
        }

        self.table
            .rules()
            .iter()
            .find(|r| r.pattern == pattern)
            .map(|r| match r.outcome {
                Outcome::Label(gesture) => gesture,
                Outcome::ThumbDirection => self.thumb_direction(hand),
            })
    }

    /// Reduce angles to straight/bent per finger
    pub fn pattern(&self, angles: &FingerAngles) -> FingerPattern {
        angles
            .0
            .map(|angle| if angle < self.bend_threshold { Bend::Straight } else { Bend::Bent })
    }

    /// Thumbs up vs thumbs down; ambiguous cases read as thumbs up
    fn thumb_direction(&self, hand: &HandKeypoints) -> Gesture {
        let dy = (hand.get(THUMB_TIP).y - hand.get(THUMB_MCP).y) as f32;
        let box_h = hand.height();
        let threshold = if box_h > 0 {
            box_h as f32 * self.thumb_direction_ratio
        } else {
            FALLBACK_DIRECTION_PX
        };

        // Screen y grows downward: a tip below its base points down
        if dy > threshold {
            Gesture::Bad
        } else {
            Gesture::Good
        }
    }
}

/// Middle and ring fingers raised and either crossed or pressed together
fn is_gang_sign(hand: &HandKeypoints) -> bool {
    let idx_tip = hand.get(INDEX_TIP);
    let mid_tip = hand.get(MIDDLE_TIP);
    let rng_tip = hand.get(RING_TIP);
    let mid_mcp = hand.get(MIDDLE_MCP);
    let rng_mcp = hand.get(RING_MCP);

    if !(mid_tip.y < mid_mcp.y && rng_tip.y < rng_mcp.y) {
        return false;
    }

    let is_crossed = (mid_tip.x - rng_tip.x).signum() * (mid_mcp.x - rng_mcp.x).signum() < 0;

    let dist_mid_rng = (mid_tip.x - rng_tip.x).abs() as f32;
    let dist_idx_mid = (idx_tip.x - mid_tip.x).abs() as f32;
    let is_touching = dist_mid_rng < dist_idx_mid * TOUCH_RATIO;

    is_crossed || is_touching
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hand::keypoints::KEYPOINT_COUNT;
    use std::collections::HashSet;

    /// Lay out a synthetic hand with the wrist at (100, 200): each finger is a
    /// vertical column that either keeps pointing up (straight) or folds back
    /// down past its knuckle (bent).
    pub(crate) fn hand_with(pattern: FingerPattern) -> HandKeypoints {
        let mut pts = vec![Keypoint::new(100, 200); KEYPOINT_COUNT];
        for (finger, bend) in pattern.iter().enumerate() {
            let base = 1 + finger * 4;
            let x = 60 + finger as i32 * 20;
            pts[base] = Keypoint::new(x, 180);
            pts[base + 1] = Keypoint::new(x, 160);
            match bend {
                Bend::Straight => {
                    pts[base + 2] = Keypoint::new(x, 140);
                    pts[base + 3] = Keypoint::new(x, 120);
                }
                Bend::Bent => {
                    pts[base + 2] = Keypoint::new(x, 170);
                    pts[base + 3] = Keypoint::new(x, 190);
                }
            }
        }
        HandKeypoints::new(&pts).unwrap()
    }

    /// Thumb straight and pointing down below the wrist, other fingers curled
    pub(crate) fn thumbs_down() -> HandKeypoints {
        let mut pts = hand_with([B, B, B, B, B]).points().to_vec();
        pts[THUMB_MCP] = Keypoint::new(90, 230);
        pts[3] = Keypoint::new(90, 260);
        pts[THUMB_TIP] = Keypoint::new(90, 290);
        HandKeypoints::new(&pts).unwrap()
    }

    fn classifier(table: RuleTable) -> GestureClassifier {
        GestureClassifier::new(&ClassifierConfig {
            table,
            ..ClassifierConfig::default()
        })
    }

    fn all_patterns() -> Vec<FingerPattern> {
        (0..32u8)
            .map(|bits| {
                let mut p = [B; 5];
                for (i, f) in p.iter_mut().enumerate() {
                    if bits & (1 << i) != 0 {
                        *f = S;
                    }
                }
                p
            })
            .collect()
    }

    #[test]
    fn test_synthetic_hand_patterns() {
        let c = classifier(RuleTable::Standard);
        for pattern in all_patterns() {
            let angles = finger_angles(&hand_with(pattern));
            assert_eq!(c.pattern(&angles), pattern);
        }
    }

    #[test]
    fn test_standard_table() {
        let c = classifier(RuleTable::Standard);
        assert_eq!(c.classify(&hand_with([S, B, S, B, S])), Some(Gesture::ThumbMidPinky));
        assert_eq!(c.classify(&hand_with([B, B, S, B, B])), Some(Gesture::No));
        assert_eq!(c.classify(&hand_with([S, S, B, B, S])), Some(Gesture::Rock));
        assert_eq!(c.classify(&hand_with([B, B, B, B, B])), Some(Gesture::Fist));
        assert_eq!(c.classify(&hand_with([B, B, S, S, S])), Some(Gesture::Ok));
        assert_eq!(c.classify(&hand_with([S, B, S, S, S])), Some(Gesture::Ok));
        assert_eq!(c.classify(&hand_with([B, S, B, B, B])), None);
    }

    #[test]
    fn test_thumb_direction() {
        let c = classifier(RuleTable::Standard);
        // Thumb pointing up along the column
        assert_eq!(c.classify(&hand_with([S, B, B, B, B])), Some(Gesture::Good));
        assert_eq!(c.classify(&thumbs_down()), Some(Gesture::Bad));
    }

    #[test]
    fn test_sideways_thumb_reads_as_good() {
        let mut pts = hand_with([B, B, B, B, B]).points().to_vec();
        // Thumb pointing sideways: dy = 0
        pts[THUMB_MCP] = Keypoint::new(70, 190);
        pts[3] = Keypoint::new(40, 190);
        pts[THUMB_TIP] = Keypoint::new(10, 190);
        let hand = HandKeypoints::new(&pts).unwrap();
        let c = classifier(RuleTable::Standard);
        assert_eq!(c.pattern(&finger_angles(&hand))[0], S);
        assert_eq!(c.classify(&hand), Some(Gesture::Good));
    }

    #[test]
    fn test_gang_sign_crossed() {
        let mut pts = hand_with([B, S, S, S, S]).points().to_vec();
        // Swap the middle and ring tips horizontally so they cross
        pts[MIDDLE_TIP].x = 140;
        pts[RING_TIP].x = 100;
        let c = classifier(RuleTable::Standard);
        assert_eq!(c.classify(&HandKeypoints::new(&pts).unwrap()), Some(Gesture::GangSign));
    }

    #[test]
    fn test_gang_sign_touching_overrides_table() {
        let mut pts = hand_with([S, S, S, S, S]).points().to_vec();
        // Middle and ring tips nearly together, far from the index tip
        pts[MIDDLE_TIP].x = 118;
        pts[RING_TIP].x = 121;
        let hand = HandKeypoints::new(&pts).unwrap();
        assert_eq!(classifier(RuleTable::Standard).classify(&hand), Some(Gesture::GangSign));
        // The numeric table has no GangSign rule
        assert_eq!(classifier(RuleTable::Numeric).classify(&hand), Some(Gesture::Digit(5)));
    }

    #[test]
    fn test_gang_sign_needs_raised_fingers() {
        let mut pts = hand_with([B, S, B, B, S]).points().to_vec();
        pts[MIDDLE_TIP].x = 140;
        pts[RING_TIP].x = 100;
        let c = classifier(RuleTable::Standard);
        // Middle/ring tips hang below their knuckles, so no GangSign; B,S,B,B,S is unlisted
        assert_eq!(c.classify(&HandKeypoints::new(&pts).unwrap()), None);
    }

    #[test]
    fn test_numeric_digits() {
        let c = classifier(RuleTable::Numeric);
        assert_eq!(c.classify(&hand_with([B, B, B, B, B])), Some(Gesture::Digit(0)));
        assert_eq!(c.classify(&hand_with([B, S, B, B, B])), Some(Gesture::Digit(1)));
        assert_eq!(c.classify(&hand_with([B, S, S, B, B])), Some(Gesture::Digit(2)));
        assert_eq!(c.classify(&hand_with([B, S, S, S, B])), Some(Gesture::Digit(3)));
        assert_eq!(c.classify(&hand_with([B, S, S, S, S])), Some(Gesture::Digit(4)));
        assert_eq!(c.classify(&hand_with([S, B, B, B, S])), Some(Gesture::Digit(6)));
        assert_eq!(c.classify(&hand_with([S, S, B, B, B])), Some(Gesture::Digit(7)));
        assert_eq!(c.classify(&hand_with([S, S, S, B, B])), Some(Gesture::Digit(8)));
        assert_eq!(c.classify(&hand_with([S, S, S, S, B])), Some(Gesture::Digit(9)));
        assert_eq!(c.classify(&hand_with([B, B, S, S, S])), Some(Gesture::Ok));
    }

    #[test]
    fn test_tables_have_no_overlapping_patterns() {
        for rules in [STANDARD_RULES, NUMERIC_RULES] {
            let unique: HashSet<FingerPattern> = rules.iter().map(|r| r.pattern).collect();
            assert_eq!(unique.len(), rules.len());
        }
    }

    #[test]
    fn test_total_and_deterministic() {
        let c = classifier(RuleTable::Standard);
        for pattern in all_patterns() {
            let hand = hand_with(pattern);
            let first = c.classify(&hand);
            assert_eq!(c.classify(&hand), first);
        }
    }

    #[test]
    fn test_malformed_points() {
        let c = classifier(RuleTable::Standard);
        assert_eq!(c.classify_points(&[]), None);
        assert_eq!(c.classify_points(&[Keypoint::new(1, 1); 5]), None);
    }
}
