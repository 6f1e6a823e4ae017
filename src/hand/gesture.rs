//! Gesture labels

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

const DIGIT_TAGS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// A recognized hand gesture
///
/// Labels serialize to the same tags the on-screen overlay and the
/// disallowed-gesture list use (`"bad!!!"`, `"ROCK!"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gesture {
    /// Index and pinky up, middle and ring crossed or pressed together
    GangSign,
    /// Thumb, middle and pinky extended
    ThumbMidPinky,
    /// Thumbs up
    Good,
    /// Thumbs down
    Bad,
    /// Middle finger
    No,
    /// Thumb, index and pinky extended
    Rock,
    Fist,
    Ok,
    /// Finger count from the numeric rule table
    Digit(u8),
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::GangSign => "GangSign",
            Gesture::ThumbMidPinky => "thumb_mid_pinky",
            Gesture::Good => "good",
            Gesture::Bad => "bad!!!",
            Gesture::No => "no!!!",
            Gesture::Rock => "ROCK!",
            Gesture::Fist => "fist",
            Gesture::Ok => "ok",
            Gesture::Digit(d) => DIGIT_TAGS[(*d as usize).min(9)],
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gesture {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let gesture = match s {
            "GangSign" => Gesture::GangSign,
            "thumb_mid_pinky" => Gesture::ThumbMidPinky,
            "good" => Gesture::Good,
            "bad!!!" => Gesture::Bad,
            "no!!!" => Gesture::No,
            "ROCK!" => Gesture::Rock,
            "fist" => Gesture::Fist,
            "ok" => Gesture::Ok,
            _ => match DIGIT_TAGS.iter().position(|tag| *tag == s) {
                Some(d) => Gesture::Digit(d as u8),
                None => return Err(ConfigError::UnknownGesture(s.to_string())),
            },
        };
        Ok(gesture)
    }
}

impl TryFrom<String> for Gesture {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gesture> for String {
    fn from(gesture: Gesture) -> Self {
        gesture.as_str().to_string()
    }
}
