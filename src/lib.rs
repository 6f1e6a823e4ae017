//! gesture-guard - Hand gesture moderation for live video
//!
//! A frame-by-frame guard that:
//! - Classifies hand gestures from 21-point hand keypoints
//! - Masks disallowed gestures once they persist across several frames
//! - Escalates repeat offences per day: face masking, a warning, then a paused stream
//! - Smooths per-frame facial emotion scores into a stable reading

pub mod config;
pub mod emotion;
pub mod error;
pub mod guard;
pub mod hand;
pub mod input;
pub mod mosaic;
pub mod pipeline;

pub use config::Config;
pub use error::{GuardError, Result};
pub use pipeline::{FrameDecision, GuardPipeline, HandDecision};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
