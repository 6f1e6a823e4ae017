//! Configuration parsing and management for gesture-guard

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, GuardError, Result};
use crate::hand::Gesture;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub debounce: DebounceConfig,
    pub escalation: EscalationConfig,
    pub region: RegionConfig,
    pub mosaic: MosaicConfig,
    pub emotion: EmotionConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self> {
        let paths = [
            Some(PathBuf::from("gesture-guard.toml")),
            Some(PathBuf::from("config/default.toml")),
            user_config_file(),
        ];

        for path in paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=180.0).contains(&self.classifier.bend_threshold) {
            return Err(invalid(
                "classifier.bend_threshold",
                "Bend threshold must be between 0 and 180 degrees",
            ));
        }

        if self.classifier.thumb_direction_ratio < 0.0 {
            return Err(invalid(
                "classifier.thumb_direction_ratio",
                "Ratio must not be negative",
            ));
        }

        if self.debounce.frames == 0 {
            return Err(invalid(
                "debounce.frames",
                "At least one frame is needed to confirm a gesture",
            ));
        }

        if self.debounce.disallowed.is_empty() {
            tracing::warn!("debounce.disallowed is empty, no gesture will ever be masked");
        }

        if self.escalation.threshold == 0 {
            return Err(invalid(
                "escalation.threshold",
                "Threshold must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.region.smooth_alpha) {
            return Err(invalid(
                "region.smooth_alpha",
                "Smoothing factor must be between 0.0 and 1.0",
            ));
        }

        if self.region.padding_ratio < 0.0 || self.region.extra_padding < 0 {
            return Err(invalid("region.padding_ratio", "Padding must not be negative"));
        }

        if self.region.min_dimension < 0 {
            return Err(invalid(
                "region.min_dimension",
                "Minimum dimension must not be negative",
            ));
        }

        if self.mosaic.downsample_divisor == 0 || self.mosaic.face_level == 0 {
            return Err(invalid(
                "mosaic.downsample_divisor",
                "Mosaic divisors must be greater than 0",
            ));
        }

        if self.mosaic.downsample_min == 0 || self.mosaic.downsample_min > self.mosaic.downsample_max
        {
            return Err(invalid(
                "mosaic.downsample_min",
                "Grid bounds must satisfy 0 < min <= max",
            ));
        }

        if self.emotion.window == 0 {
            return Err(invalid("emotion.window", "Window must hold at least one frame"));
        }

        if !(0.0..=100.0).contains(&self.emotion.confidence_threshold) {
            return Err(invalid(
                "emotion.confidence_threshold",
                "Threshold must be between 0 and 100",
            ));
        }

        if self.emotion.analyze_every_n_frames == 0 {
            return Err(invalid(
                "emotion.analyze_every_n_frames",
                "Sampling interval must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> GuardError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Gesture classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fingers bent less than this many degrees count as straight
    pub bend_threshold: f32,
    /// Thumb up/down threshold as a fraction of the hand's height
    pub thumb_direction_ratio: f32,
    /// Which rule table to classify with
    pub table: RuleTable,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            bend_threshold: 50.0,
            thumb_direction_ratio: 0.12,
            table: RuleTable::Standard,
        }
    }
}

/// Gesture rule table selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTable {
    /// Offensive gestures and a handful of neutral ones
    Standard,
    /// Standard gestures plus finger counting 0-9
    Numeric,
}

/// Temporal debouncing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Consecutive frames a disallowed gesture must persist before it counts
    pub frames: u32,
    /// Gestures that get masked and counted
    pub disallowed: Vec<Gesture>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            frames: 3,
            disallowed: vec![Gesture::No, Gesture::Bad, Gesture::ThumbMidPinky, Gesture::Ok],
        }
    }
}

/// Daily escalation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Confirmed gestures per day before face masking and high warning
    pub threshold: u32,
    /// Where the day's counter is persisted
    pub state_file: PathBuf,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            state_file: PathBuf::from("gesture_log.json"),
        }
    }
}

/// Masked region geometry and smoothing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Padding as a fraction of the larger box side
    pub padding_ratio: f32,
    /// Fixed padding added on every side, in pixels
    pub extra_padding: i32,
    /// Smallest width/height of a masked region, in pixels
    pub min_dimension: i32,
    /// Weight of the previous box when blending (0.0 - 1.0)
    pub smooth_alpha: f32,
    /// Frames without a masked hand before the previous box is forgotten
    pub max_missed_frames: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            padding_ratio: 0.20,
            extra_padding: 8,
            min_dimension: 50,
            smooth_alpha: 0.65,
            max_missed_frames: 5,
        }
    }
}

/// Pixelation grid sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Smallest hand mosaic grid along either axis
    pub downsample_min: u32,
    /// Largest hand mosaic grid along either axis
    pub downsample_max: u32,
    /// Region side divided by this gives the hand grid size
    pub downsample_divisor: u32,
    /// Face region side divided by this gives the face grid size
    pub face_level: u32,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            downsample_min: 8,
            downsample_max: 16,
            downsample_divisor: 4,
            face_level: 15,
        }
    }
}

/// Emotion smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Number of analyzed frames kept for smoothing
    pub window: usize,
    /// Minimum smoothed confidence (0-100) to report an emotion
    pub confidence_threshold: f32,
    /// Analyze one frame out of every N
    pub analyze_every_n_frames: u32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            window: 15,
            confidence_threshold: 30.0,
            analyze_every_n_frames: 2,
        }
    }
}

/// Per-user `gesture-guard/config.toml`, if the platform has a config home
fn user_config_file() -> Option<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        PathBuf::from(std::env::var_os("APPDATA")?)
    } else if cfg!(target_os = "macos") {
        PathBuf::from(std::env::var_os("HOME")?).join("Library/Application Support")
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?
    };
    Some(base.join("gesture-guard").join("config.toml"))
}
