//! Error types
//!
//! Only `PipelineError` ever reaches the caller of `Controller::start`.
//! Everything else is recovered where it happens and logged.

use std::net::SocketAddr;
use thiserror::Error;

/// Lifecycle errors surfaced by the controller
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("no threshold configured: set SENSOR_THRESHOLD or provide {0}")]
    MissingThreshold(String),

    #[error("threshold file unusable: {0}")]
    Threshold(#[from] ModelError),
}

/// A frame that could not be turned into a sample
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    #[error("frame is not valid UTF-8")]
    NotUtf8,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("field '{0}' is not a finite number")]
    NotNumeric(String),

    #[error("layout field '{0}' is missing")]
    MissingField(String),

    #[error("message carries no feature values")]
    Empty,
}

/// Scorer invocation failure (no verdict for this sample)
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("scorer returned a non-finite value: {0}")]
    NonFinite(f32),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("scorer panicked: {0}")]
    Panicked(String),
}

/// Notifier invocation failure
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("notifier timed out after {0} ms")]
    Timeout(u64),

    #[error("notifier panicked: {0}")]
    Panicked(String),
}

/// Model artifact loading errors (fatal at bootstrap)
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("onnx runtime: {0}")]
    Runtime(String),
}
