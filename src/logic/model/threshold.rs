//! Anomaly Threshold
//!
//! Scalar fixed at startup. A score is anomalous only when strictly greater.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logic::config::PipelineConfig;
use crate::logic::error::{ConfigError, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold(f32);

impl Threshold {
    /// `None` for NaN or infinite values
    pub fn new(value: f32) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Strict greater-than: a score equal to the threshold is not anomalous
    pub fn is_exceeded_by(&self, score: f32) -> bool {
        score > self.0
    }

    /// Read a threshold text file (a single float, surrounding whitespace allowed)
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ModelError::NotFound(display));
        }

        let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: display.clone(),
            source,
        })?;
        let value: f32 = content.trim().parse().map_err(|e| ModelError::Parse {
            path: display.clone(),
            reason: format!("{}", e),
        })?;

        Self::new(value).ok_or(ModelError::Parse {
            path: display,
            reason: "threshold must be finite".to_string(),
        })
    }

    /// Explicit value from config, else the threshold file
    pub fn resolve(config: &PipelineConfig) -> Result<Self, ConfigError> {
        if let Some(value) = config.threshold.and_then(Self::new) {
            log::info!("Using configured threshold {:.6}", value.0);
            return Ok(value);
        }

        match Self::load(&config.threshold_file) {
            Ok(threshold) => {
                log::info!(
                    "Loaded threshold {:.6} from {}",
                    threshold.0,
                    config.threshold_file.display()
                );
                Ok(threshold)
            }
            Err(ModelError::NotFound(path)) => Err(ConfigError::MissingThreshold(path)),
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
