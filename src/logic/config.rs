//! Configuration module
//!
//! Pipeline settings from environment variables (a `.env` file is loaded by
//! the binary before this runs). Unset variables fall back to `constants`.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{self, default_model_dir};
use super::error::ConfigError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Listen address
    pub bind_addr: SocketAddr,

    /// Sample window size
    pub buffer_capacity: usize,

    /// Explicit threshold (wins over `threshold_file`)
    pub threshold: Option<f32>,

    /// Threshold text file produced at training time
    pub threshold_file: PathBuf,

    /// ONNX autoencoder artifact
    pub model_path: PathBuf,

    /// Expected SHA-256 of the model artifact (hex)
    pub model_sha256: Option<String>,

    /// Fitted normalizer (JSON)
    pub normalizer_path: PathBuf,

    /// Field order for feature extraction; wire order when unset
    pub feature_layout: Option<Vec<String>>,

    /// Fields never treated as features
    pub ignored_fields: Vec<String>,

    pub max_frame_bytes: usize,
    pub max_connections: usize,
    pub accept_poll_interval: Duration,
    pub idle_interval: Duration,
    pub stop_timeout: Duration,
    pub notify_timeout: Duration,
    pub event_queue_capacity: usize,

    /// Enables the webhook notifier
    pub webhook_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let model_dir = default_model_dir();
        Self {
            bind_addr: constants::DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 5000))),
            buffer_capacity: constants::DEFAULT_BUFFER_CAPACITY,
            threshold: None,
            threshold_file: model_dir.join(constants::THRESHOLD_FILE_NAME),
            model_path: model_dir.join(constants::MODEL_FILE_NAME),
            model_sha256: None,
            normalizer_path: model_dir.join(constants::NORMALIZER_FILE_NAME),
            feature_layout: None,
            ignored_fields: constants::DEFAULT_IGNORED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_frame_bytes: constants::DEFAULT_MAX_FRAME_BYTES,
            max_connections: constants::DEFAULT_MAX_CONNECTIONS,
            accept_poll_interval: Duration::from_millis(constants::DEFAULT_ACCEPT_POLL_MS),
            idle_interval: Duration::from_millis(constants::DEFAULT_IDLE_INTERVAL_MS),
            stop_timeout: Duration::from_millis(constants::DEFAULT_STOP_TIMEOUT_MS),
            notify_timeout: Duration::from_millis(constants::DEFAULT_NOTIFY_TIMEOUT_MS),
            event_queue_capacity: constants::DEFAULT_EVENT_QUEUE_CAPACITY,
            webhook_url: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parsed::<SocketAddr, _>(&lookup, "SENSOR_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(capacity) = parsed::<usize, _>(&lookup, "SENSOR_BUFFER_CAPACITY")? {
            if capacity == 0 {
                return Err(invalid("SENSOR_BUFFER_CAPACITY", "0", "must be at least 1"));
            }
            config.buffer_capacity = capacity;
        }
        if let Some(threshold) = parsed::<f32, _>(&lookup, "SENSOR_THRESHOLD")? {
            if !threshold.is_finite() {
                return Err(invalid("SENSOR_THRESHOLD", &threshold.to_string(), "must be finite"));
            }
            config.threshold = Some(threshold);
        }

        // Model directory override moves every artifact default along with it
        if let Some(dir) = non_empty(&lookup, "SENSOR_MODEL_DIR") {
            let dir = PathBuf::from(dir);
            config.threshold_file = dir.join(constants::THRESHOLD_FILE_NAME);
            config.model_path = dir.join(constants::MODEL_FILE_NAME);
            config.normalizer_path = dir.join(constants::NORMALIZER_FILE_NAME);
        }
        if let Some(path) = non_empty(&lookup, "SENSOR_THRESHOLD_FILE") {
            config.threshold_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty(&lookup, "SENSOR_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(&lookup, "SENSOR_NORMALIZER_PATH") {
            config.normalizer_path = PathBuf::from(path);
        }
        if let Some(sum) = non_empty(&lookup, "SENSOR_MODEL_SHA256") {
            let sum = sum.to_ascii_lowercase();
            if sum.len() != 64 || !sum.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid("SENSOR_MODEL_SHA256", &sum, "expected 64 hex characters"));
            }
            config.model_sha256 = Some(sum);
        }

        if let Some(layout) = non_empty(&lookup, "SENSOR_FEATURE_LAYOUT") {
            let fields = split_list(&layout);
            if fields.is_empty() {
                return Err(invalid("SENSOR_FEATURE_LAYOUT", &layout, "no field names"));
            }
            config.feature_layout = Some(fields);
        }
        if let Some(ignored) = lookup("SENSOR_IGNORED_FIELDS") {
            config.ignored_fields = split_list(&ignored);
        }

        if let Some(limit) = parsed::<usize, _>(&lookup, "SENSOR_MAX_FRAME_BYTES")? {
            config.max_frame_bytes = limit.max(1);
        }
        if let Some(max) = parsed::<usize, _>(&lookup, "SENSOR_MAX_CONNECTIONS")? {
            config.max_connections = max.max(1);
        }
        if let Some(ms) = parsed::<u64, _>(&lookup, "SENSOR_ACCEPT_POLL_MS")? {
            config.accept_poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = parsed::<u64, _>(&lookup, "SENSOR_IDLE_INTERVAL_MS")? {
            config.idle_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = parsed::<u64, _>(&lookup, "SENSOR_STOP_TIMEOUT_MS")? {
            config.stop_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64, _>(&lookup, "SENSOR_NOTIFY_TIMEOUT_MS")? {
            config.notify_timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(capacity) = parsed::<usize, _>(&lookup, "SENSOR_EVENT_QUEUE")? {
            config.event_queue_capacity = capacity.max(1);
        }

        config.webhook_url = non_empty(&lookup, "SENSOR_WEBHOOK_URL");

        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, var) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(var, &raw, &e.to_string())),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.buffer_capacity, 100);
        assert!(config.threshold.is_none());
        assert_eq!(config.ignored_fields, vec!["Time".to_string()]);
        assert_eq!(config.idle_interval, Duration::from_millis(100));
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("SENSOR_BIND_ADDR", "127.0.0.1:6001"),
            ("SENSOR_BUFFER_CAPACITY", "8"),
            ("SENSOR_THRESHOLD", "0.25"),
            ("SENSOR_FEATURE_LAYOUT", "temp_j1, temp_j2 ,payload"),
            ("SENSOR_IGNORED_FIELDS", ""),
            ("SENSOR_MODEL_DIR", "/opt/models"),
            ("SENSOR_WEBHOOK_URL", "http://localhost:9000/hook"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 6001);
        assert_eq!(config.buffer_capacity, 8);
        assert_eq!(config.threshold, Some(0.25));
        assert_eq!(
            config.feature_layout,
            Some(vec!["temp_j1".into(), "temp_j2".into(), "payload".into()])
        );
        assert!(config.ignored_fields.is_empty());
        assert_eq!(config.model_path, PathBuf::from("/opt/models/autoencoder.onnx"));
        assert_eq!(config.threshold_file, PathBuf::from("/opt/models/threshold.txt"));
        assert_eq!(config.webhook_url.as_deref(), Some("http://localhost:9000/hook"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = PipelineConfig::from_lookup(lookup_from(&[("SENSOR_BUFFER_CAPACITY", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SENSOR_BUFFER_CAPACITY", .. }));

        let err = PipelineConfig::from_lookup(lookup_from(&[("SENSOR_BUFFER_CAPACITY", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = PipelineConfig::from_lookup(lookup_from(&[("SENSOR_MODEL_SHA256", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SENSOR_MODEL_SHA256", .. }));
    }
}
