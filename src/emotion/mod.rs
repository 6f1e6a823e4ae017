//! Facial emotion smoothing module
//!
//! Per-frame emotion scores come from an external face analysis model. They
//! flicker from frame to frame, so they are buffered and combined with a
//! recency-weighted average before a dominant emotion is reported.

pub mod smoother;

pub use smoother::{EmotionSmoother, EmotionStatus, SmoothedEmotion};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Emotion categories reported by the face analysis model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All categories, in score order
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == s)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One score (0-100) per emotion category
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmotionScores([f32; 7]);

impl EmotionScores {
    pub fn new(scores: [f32; 7]) -> Self {
        Self(scores)
    }

    /// Build from the model's label -> score map
    ///
    /// Unknown labels are ignored and missing categories score 0.
    pub fn from_map(map: &HashMap<String, f32>) -> Self {
        let mut scores = [0.0; 7];
        for (label, score) in map {
            match Emotion::from_label(label) {
                Some(emotion) => scores[emotion.index()] = *score,
                None => tracing::debug!("Ignoring unknown emotion label: {}", label),
            }
        }
        Self(scores)
    }

    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0[emotion.index()]
    }

    pub fn set(&mut self, emotion: Emotion, score: f32) {
        self.0[emotion.index()] = score;
    }

    /// Highest-scoring category; ties go to the earlier category
    pub fn dominant(&self) -> (Emotion, f32) {
        Emotion::ALL
            .iter()
            .map(|&e| (e, self.get(e)))
            .fold((Emotion::Angry, f32::MIN), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    }

    /// Iterate `(category, score)` pairs in category order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }
}
