//! Anomaly event types

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::ingest::Sample;

/// A detected threshold exceedance. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub id: Uuid,
    pub sample: Arc<Sample>,
    pub score: f32,
    pub threshold: f32,
    pub detected_at: DateTime<Utc>,
    pub hostname: Option<String>,
}

impl AnomalyEvent {
    pub fn new(sample: Arc<Sample>, score: f32, threshold: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            sample,
            score,
            threshold,
            detected_at: Utc::now(),
            hostname: local_hostname(),
        }
    }

    /// How far above the threshold the score landed, relative to it
    pub fn excess_ratio(&self) -> f32 {
        if self.threshold.abs() < f32::EPSILON {
            return self.score - self.threshold;
        }
        (self.score - self.threshold) / self.threshold.abs()
    }

    pub fn summary(&self) -> String {
        let origin = self
            .sample
            .origin
            .map(|a| a.to_string())
            .unwrap_or_else(|| "local".to_string());
        format!(
            "error {:.4} > threshold {:.4} (sample {} from {}, {} features)",
            self.score,
            self.threshold,
            self.sample.id,
            origin,
            self.sample.len()
        )
    }
}

fn local_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned())
}
