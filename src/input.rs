//! Recorded frame input
//!
//! Frames are read as JSON lines, one detector result per line:
//!
//! ```json
//! {"width": 720, "height": 540, "hands": [[[0.41, 0.72], ...]], "faces": [[300, 80, 120, 120]]}
//! ```
//!
//! Hand keypoints are normalized to 0..1 as the hand detector reports them.
//! Face boxes are `[x, y, w, h]` in pixels. `emotion` optionally carries the
//! face analysis scores for the frame.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::emotion::EmotionScores;
use crate::error::{GuardError, InputError};
use crate::hand::HandKeypoints;

/// One recorded frame's detector output
#[derive(Debug, Clone, Deserialize)]
pub struct FramePacket {
    pub width: u32,
    pub height: u32,
    /// Normalized keypoints per detected hand, in detection order
    #[serde(default)]
    pub hands: Vec<Vec<[f32; 2]>>,
    /// Face boxes `[x, y, w, h]` in pixels
    #[serde(default)]
    pub faces: Vec<[i32; 4]>,
    /// Emotion label -> score (0-100); absent when the frame was not analyzed
    /// or no face was found
    #[serde(default)]
    pub emotion: Option<HashMap<String, f32>>,
}

impl FramePacket {
    /// Parse one JSON line. `line` is the 1-based line number used in errors.
    pub fn parse(json: &str, line: usize) -> Result<Self, InputError> {
        let packet: FramePacket = serde_json::from_str(json).map_err(|e| InputError::Parse {
            line,
            message: e.to_string(),
        })?;

        if packet.width == 0 || packet.height == 0 {
            return Err(InputError::FrameSize {
                line,
                width: packet.width,
                height: packet.height,
            });
        }

        Ok(packet)
    }

    /// Hands scaled to pixel coordinates; hands without exactly 21 points are dropped
    pub fn hand_keypoints(&self) -> Vec<HandKeypoints> {
        self.hands
            .iter()
            .filter_map(|points| {
                let hand = HandKeypoints::from_normalized(points, self.width, self.height);
                if hand.is_none() {
                    tracing::debug!("Dropping hand with {} keypoints", points.len());
                }
                hand
            })
            .collect()
    }

    pub fn emotion_scores(&self) -> Option<EmotionScores> {
        self.emotion.as_ref().map(EmotionScores::from_map)
    }
}

/// Iterates frames from a JSON-lines source
///
/// Blank lines and lines starting with `#` are skipped.
pub struct FrameReader<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl FrameReader<Box<dyn BufRead>> {
    /// Open a recording, `-` meaning standard input
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let reader: Box<dyn BufRead> = if path == Path::new("-") {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let file = File::open(path)
                .map_err(|e| InputError::Open(format!("{}: {}", path.display(), e)))?;
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = crate::Result<FramePacket>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line += 1;
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(FramePacket::parse(trimmed, self.line).map_err(GuardError::from));
        }
    }
}
