//! Recency-weighted emotion smoothing

use std::collections::VecDeque;

use super::{Emotion, EmotionScores};
use crate::config::EmotionConfig;

/// Dominant emotion after smoothing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedEmotion {
    pub emotion: Emotion,
    /// Weighted score of the dominant emotion, 0-100
    pub confidence: f32,
    /// Weighted score of every category
    pub scores: EmotionScores,
}

/// What the smoother can currently say
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmotionStatus {
    /// No face has been analyzed yet
    Detecting,
    /// Still filling the buffer
    Collecting { have: usize, window: usize },
    /// Enough data, but no emotion stands out
    LowConfidence,
    Stable(SmoothedEmotion),
}

/// Buffers per-frame emotion scores and reports a smoothed dominant emotion
#[derive(Debug, Clone)]
pub struct EmotionSmoother {
    window: usize,
    confidence_threshold: f32,
    analyze_every: u32,
    frame_count: u64,
    buffer: VecDeque<EmotionScores>,
}

impl EmotionSmoother {
    pub fn new(config: &EmotionConfig) -> Self {
        let window = config.window.max(1);
        Self {
            window,
            confidence_threshold: config.confidence_threshold,
            analyze_every: config.analyze_every_n_frames.max(1),
            frame_count: 0,
            buffer: VecDeque::with_capacity(window),
        }
    }

    /// Advance the frame counter; true when this frame should be analyzed
    pub fn should_analyze(&mut self) -> bool {
        self.frame_count += 1;
        self.frame_count % self.analyze_every as u64 == 0
    }

    /// Add one analysis result. `None` (no face found) leaves the buffer untouched.
    pub fn push(&mut self, scores: Option<EmotionScores>) {
        let Some(scores) = scores else {
            return;
        };
        if self.buffer.len() == self.window {
            self.buffer.pop_front();
        }
        self.buffer.push_back(scores);
    }

    /// Weighted average of the buffer, if its dominant emotion is confident enough
    ///
    /// Weights grow exponentially from oldest to newest (`e^0` to `e^2`) and
    /// are normalised to sum to one.
    pub fn smoothed(&self) -> Option<SmoothedEmotion> {
        if self.buffer.is_empty() {
            return None;
        }

        let weights = recency_weights(self.buffer.len());
        let mut sum = EmotionScores::default();
        for (frame, weight) in self.buffer.iter().zip(weights) {
            for (emotion, score) in frame.iter() {
                sum.set(emotion, sum.get(emotion) + score * weight);
            }
        }

        let (emotion, confidence) = sum.dominant();
        let confidence = confidence.clamp(0.0, 100.0);
        if confidence >= self.confidence_threshold {
            Some(SmoothedEmotion {
                emotion,
                confidence,
                scores: sum,
            })
        } else {
            None
        }
    }

    pub fn status(&self) -> EmotionStatus {
        if let Some(smoothed) = self.smoothed() {
            return EmotionStatus::Stable(smoothed);
        }

        let have = self.buffer.len();
        if have == 0 {
            EmotionStatus::Detecting
        } else if have < self.window / 2 {
            EmotionStatus::Collecting {
                have,
                window: self.window,
            }
        } else {
            EmotionStatus::LowConfidence
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// `exp(linspace(0, 2, n))`, normalised
fn recency_weights(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    let raw: Vec<f32> = (0..n)
        .map(|i| (2.0 * i as f32 / (n - 1) as f32).exp())
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(emotion: Emotion, score: f32) -> EmotionScores {
        let mut s = EmotionScores::default();
        s.set(emotion, score);
        s
    }

    fn smoother() -> EmotionSmoother {
        EmotionSmoother::new(&EmotionConfig::default())
    }

    #[test]
    fn test_weights() {
        assert_eq!(recency_weights(1), vec![1.0]);

        let w = recency_weights(15);
        let total: f32 = w.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(w.windows(2).all(|p| p[1] > p[0]));
        assert!((w[14] / w[0] - 2f32.exp()).abs() < 1e-3);
    }

    #[test]
    fn test_empty_is_none() {
        let s = smoother();
        assert!(s.smoothed().is_none());
        assert_eq!(s.status(), EmotionStatus::Detecting);
    }

    #[test]
    fn test_single_frame() {
        let mut s = smoother();
        s.push(Some(only(Emotion::Happy, 90.0)));
        let result = s.smoothed().unwrap();
        assert_eq!(result.emotion, Emotion::Happy);
        assert!((result.confidence - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_below_threshold() {
        let mut s = smoother();
        s.push(Some(only(Emotion::Sad, 20.0)));
        assert!(s.smoothed().is_none());
        assert_eq!(s.status(), EmotionStatus::Collecting { have: 1, window: 15 });

        for _ in 0..10 {
            s.push(Some(only(Emotion::Sad, 20.0)));
        }
        assert_eq!(s.status(), EmotionStatus::LowConfidence);
    }

    #[test]
    fn test_recent_frames_dominate() {
        let mut s = smoother();
        for _ in 0..7 {
            s.push(Some(only(Emotion::Angry, 80.0)));
        }
        for _ in 0..8 {
            s.push(Some(only(Emotion::Happy, 80.0)));
        }
        assert_eq!(s.smoothed().unwrap().emotion, Emotion::Happy);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut s = smoother();
        for _ in 0..15 {
            s.push(Some(only(Emotion::Angry, 100.0)));
        }
        for _ in 0..15 {
            s.push(Some(only(Emotion::Neutral, 60.0)));
        }
        assert_eq!(s.len(), 15);
        let result = s.smoothed().unwrap();
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.scores.get(Emotion::Angry), 0.0);
    }

    #[test]
    fn test_failed_analysis_appends_nothing() {
        let mut s = smoother();
        s.push(None);
        assert!(s.is_empty());
    }

    #[test]
    fn test_confidence_clamped() {
        let mut s = smoother();
        s.push(Some(only(Emotion::Fear, 250.0)));
        s.push(Some(only(Emotion::Fear, 150.0)));
        assert_eq!(s.smoothed().unwrap().confidence, 100.0);
    }

    #[test]
    fn test_frame_sampling() {
        let mut s = smoother();
        let analyzed: Vec<bool> = (0..6).map(|_| s.should_analyze()).collect();
        assert_eq!(analyzed, vec![false, true, false, true, false, true]);
    }
}
