//! Inference Engine - ONNX Runtime Integration
//!
//! Autoencoder scorer: normalize the point, reconstruct it, return the mean
//! squared reconstruction error.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::config::PipelineConfig;
use crate::logic::error::{ModelError, ScoreError};
use super::normalizer::Normalizer;
use super::scorer::Scorer;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub sha256: String,
    pub features: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Engine Status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_name: String,
    pub inference_device: String,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
}

// ============================================================================
// ONNX SCORER
// ============================================================================

pub struct OnnxScorer {
    session: Mutex<Session>,
    output_name: String,
    normalizer: Normalizer,
    metadata: ModelMetadata,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl OnnxScorer {
    /// Load model + normalizer named by the config
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ModelError> {
        let normalizer = Normalizer::load(&config.normalizer_path)?;
        Self::load(&config.model_path, normalizer, config.model_sha256.as_deref())
    }

    /// Load an ONNX model, verifying its checksum when one is given
    pub fn load(
        model_path: &Path,
        normalizer: Normalizer,
        expected_sha256: Option<&str>,
    ) -> Result<Self, ModelError> {
        let display = model_path.display().to_string();
        log::info!("Loading ONNX model from: {}", display);

        if !model_path.exists() {
            return Err(ModelError::NotFound(display));
        }

        let model_bytes = std::fs::read(model_path).map_err(|source| ModelError::Io {
            path: display.clone(),
            source,
        })?;

        let digest = sha256_hex(&model_bytes);
        if let Some(expected) = expected_sha256 {
            if !expected.eq_ignore_ascii_case(&digest) {
                return Err(ModelError::ChecksumMismatch {
                    path: display,
                    expected: expected.to_string(),
                    actual: digest,
                });
            }
            log::info!("Model checksum verified");
        } else {
            log::info!("Model sha256: {}", digest);
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| ModelError::Runtime(format!("Failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Runtime("No output defined".to_string()))?;

        let metadata = ModelMetadata {
            model_path: display,
            sha256: digest,
            features: normalizer.feature_count(),
            loaded_at: Utc::now(),
        };

        log::info!(
            "ONNX model loaded successfully ({} features, output '{}')",
            metadata.features,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            normalizer,
            metadata,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_name: self.metadata.model_path.clone(),
            inference_device: "ONNX Runtime (CPU)".to_string(),
            avg_latency_ms: avg,
            inference_count: count,
        }
    }

    fn reconstruct(&self, normalized: &[f32]) -> Result<Vec<f32>, ScoreError> {
        let input_array = Array2::<f32>::from_shape_vec((1, normalized.len()), normalized.to_vec())
            .map_err(|e| ScoreError::Inference(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ScoreError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ScoreError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| ScoreError::Inference("No output".to_string()))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoreError::Inference(format!("Extract error: {}", e)))?;

        Ok(output_tensor.1.to_vec())
    }
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &[f32]) -> Result<f32, ScoreError> {
        let start_time = std::time::Instant::now();

        let normalized = self.normalizer.transform(features)?;
        let reconstructed = self.reconstruct(&normalized)?;

        let error = reconstruction_mse(&normalized, &reconstructed)?;

        self.latency_sum_us
            .fetch_add(start_time.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(error)
    }

    fn expected_features(&self) -> Option<usize> {
        Some(self.normalizer.feature_count())
    }

    fn name(&self) -> &str {
        "onnx-autoencoder"
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Mean squared error between a point and its reconstruction
pub fn reconstruction_mse(original: &[f32], reconstructed: &[f32]) -> Result<f32, ScoreError> {
    if original.is_empty() || reconstructed.len() < original.len() {
        return Err(ScoreError::DimensionMismatch {
            expected: original.len(),
            actual: reconstructed.len(),
        });
    }

    let sum: f32 = original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).powi(2))
        .sum();
    Ok(sum / original.len() as f32)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruction_mse() {
        let mse = reconstruction_mse(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 2.0]).unwrap();
        assert!((mse - 1.0).abs() < 1e-6);

        assert!(reconstruction_mse(&[1.0, 2.0], &[1.0]).is_err());
        assert!(reconstruction_mse(&[], &[]).is_err());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_load_rejects_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoencoder.onnx");
        std::fs::write(&path, b"not really a model").unwrap();

        let normalizer = Normalizer::MinMax { min: vec![0.0], max: vec![1.0] };
        let result = OnnxScorer::load(&path, normalizer, Some(&"0".repeat(64)));
        assert!(matches!(result, Err(ModelError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = Normalizer::MinMax { min: vec![0.0], max: vec![1.0] };
        let result = OnnxScorer::load(&dir.path().join("absent.onnx"), normalizer, None);
        assert!(matches!(result, Err(ModelError::NotFound(_))));
    }
}
