//! Scorer contract
//!
//! A scorer maps one feature vector to a continuous error value. The analysis
//! loop only ever sees this trait, so the model behind it can be swapped.

use crate::logic::error::ScoreError;

/// Anomaly scorer. Must stay cheap enough to call many times per second.
pub trait Scorer: Send + Sync {
    fn score(&self, features: &[f32]) -> Result<f32, ScoreError>;

    /// Fixed input length, when the model has one
    fn expected_features(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str {
        "scorer"
    }
}

/// Scorer backed by a closure
pub struct FnScorer<F> {
    name: String,
    func: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&[f32]) -> Result<f32, ScoreError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Scorer for FnScorer<F>
where
    F: Fn(&[f32]) -> Result<f32, ScoreError> + Send + Sync,
{
    fn score(&self, features: &[f32]) -> Result<f32, ScoreError> {
        (self.func)(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Run a scorer and enforce the contract: matching length and a finite result
pub fn score_checked(scorer: &dyn Scorer, features: &[f32]) -> Result<f32, ScoreError> {
    if let Some(expected) = scorer.expected_features() {
        if expected != features.len() {
            return Err(ScoreError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }
    }

    let error = scorer.score(features)?;
    if !error.is_finite() {
        return Err(ScoreError::NonFinite(error));
    }
    Ok(error)
}
