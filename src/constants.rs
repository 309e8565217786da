//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! `PipelineConfig::from_env` falls back to these when a variable is unset.

use std::path::PathBuf;

/// Default listen address (all interfaces)
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Default sample window size
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Default frame size limit (bytes, newline excluded)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Default number of concurrently served producer connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Default accept wait bound (milliseconds)
pub const DEFAULT_ACCEPT_POLL_MS: u64 = 1_000;

/// Default processor idle wait bound (milliseconds)
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 100;

/// Default bound on `Controller::stop` joining its tasks (milliseconds)
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 2_000;

/// Default per-invocation notifier timeout (milliseconds)
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;

/// Default notification queue capacity
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;

/// Fields skipped when decoding a frame (the timestamp column the model never saw)
pub const DEFAULT_IGNORED_FIELDS: &[&str] = &["Time"];

/// Model artifact file names inside the model directory
pub const MODEL_FILE_NAME: &str = "autoencoder.onnx";
pub const NORMALIZER_FILE_NAME: &str = "normalizer.json";
pub const THRESHOLD_FILE_NAME: &str = "threshold.txt";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Robot Telemetry";

/// Default directory holding the model artifacts
pub fn default_model_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("robot-telemetry")
        .join("models")
}
