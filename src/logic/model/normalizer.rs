//! Feature normalizer fitted at training time
//!
//! Stored as JSON next to the model:
//! `{"kind": "standard", "mean": [...], "scale": [...]}` or
//! `{"kind": "min_max", "min": [...], "max": [...]}`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logic::error::{ModelError, ScoreError};

/// Smallest divisor used for constant features
const MIN_SPREAD: f32 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalizer {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f32>, scale: Vec<f32> },
    /// `(x - min) / (max - min)`
    MinMax { min: Vec<f32>, max: Vec<f32> },
}

impl Normalizer {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ModelError::NotFound(display));
        }

        let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: display.clone(),
            source,
        })?;
        let normalizer: Normalizer =
            serde_json::from_str(&content).map_err(|e| ModelError::Parse {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        normalizer.validate().map_err(|reason| ModelError::Parse {
            path: display,
            reason,
        })?;

        log::info!(
            "Loaded {} normalizer ({} features)",
            normalizer.kind(),
            normalizer.feature_count()
        );
        Ok(normalizer)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Normalizer::Standard { .. } => "standard",
            Normalizer::MinMax { .. } => "min_max",
        }
    }

    pub fn feature_count(&self) -> usize {
        match self {
            Normalizer::Standard { mean, .. } => mean.len(),
            Normalizer::MinMax { min, .. } => min.len(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let (a, b) = match self {
            Normalizer::Standard { mean, scale } => (mean, scale),
            Normalizer::MinMax { min, max } => (min, max),
        };
        if a.is_empty() {
            return Err("normalizer has no features".to_string());
        }
        if a.len() != b.len() {
            return Err(format!("parameter lengths differ ({} vs {})", a.len(), b.len()));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err("parameters must be finite".to_string());
        }
        Ok(())
    }

    /// Normalize one feature vector
    pub fn transform(&self, features: &[f32]) -> Result<Vec<f32>, ScoreError> {
        let expected = self.feature_count();
        if features.len() != expected {
            return Err(ScoreError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        let normalized = match self {
            Normalizer::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale.iter()))
                .map(|(x, (m, s))| (x - m) / nonzero(*s))
                .collect(),
            Normalizer::MinMax { min, max } => features
                .iter()
                .zip(min.iter().zip(max.iter()))
                .map(|(x, (lo, hi))| (x - lo) / nonzero(hi - lo))
                .collect(),
        };
        Ok(normalized)
    }
}

fn nonzero(spread: f32) -> f32 {
    if spread.abs() < MIN_SPREAD {
        1.0
    } else {
        spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_transform() {
        let norm = Normalizer::Standard {
            mean: vec![10.0, 0.0],
            scale: vec![2.0, 0.0],
        };
        // Zero scale leaves the centred value untouched
        assert_eq!(norm.transform(&[14.0, 3.0]).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_min_max_transform() {
        let norm = Normalizer::MinMax {
            min: vec![0.0, 20.0],
            max: vec![100.0, 48.0],
        };
        assert_eq!(norm.transform(&[50.0, 34.0]).unwrap(), vec![0.5, 0.5]);
        assert!(matches!(
            norm.transform(&[1.0]),
            Err(ScoreError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalizer.json");

        fs::write(&path, r#"{"kind": "standard", "mean": [1.0, 2.0], "scale": [0.5, 0.5]}"#).unwrap();
        let norm = Normalizer::load(&path).unwrap();
        assert_eq!(norm.kind(), "standard");
        assert_eq!(norm.feature_count(), 2);

        fs::write(&path, r#"{"kind": "min_max", "min": [1.0], "max": [2.0, 3.0]}"#).unwrap();
        assert!(matches!(Normalizer::load(&path), Err(ModelError::Parse { .. })));

        fs::write(&path, r#"{"kind": "robust"}"#).unwrap();
        assert!(matches!(Normalizer::load(&path), Err(ModelError::Parse { .. })));
    }
}
