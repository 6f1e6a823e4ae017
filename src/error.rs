//! Error types for gesture-guard

use thiserror::Error;

/// Main error type for gesture-guard
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },

    #[error("Unknown gesture label: {0}")]
    UnknownGesture(String),
}

/// Penalty state persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read state file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse state file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to write state file {path}: {message}")]
    Write { path: String, message: String },
}

/// Recorded frame input errors
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to open input: {0}")]
    Open(String),

    #[error("Frame {line}: JSON parse error: {message}")]
    Parse { line: usize, message: String },

    #[error("Frame {line}: invalid frame size {width}x{height}")]
    FrameSize { line: usize, width: u32, height: u32 },
}

/// Result type alias for gesture-guard operations
pub type Result<T> = std::result::Result<T, GuardError>;
