//! Model Module - anomaly scoring
//!
//! The analysis loop depends only on `Scorer` and `Threshold`; the ONNX
//! autoencoder is one implementation.

pub mod inference;
pub mod normalizer;
pub mod scorer;
pub mod threshold;

pub use inference::{EngineStatus, ModelMetadata, OnnxScorer};
pub use normalizer::Normalizer;
pub use scorer::{score_checked, FnScorer, Scorer};
pub use threshold::Threshold;
