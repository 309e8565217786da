//! Logic Module - ingestion, scoring and alerting engines
//!
//! - `ingest/` - TCP listener, connection framing, sample window
//! - `model/` - scorer contract, threshold, ONNX autoencoder
//! - `alert/` - anomaly events, notifiers, dispatcher
//! - `analysis_loop` - freshest-sample scoring loop
//! - `controller` - lifecycle of the whole pipeline

pub mod alert;
pub mod analysis_loop;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod ingest;
pub mod model;
pub mod stats;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use controller::Controller;
pub use error::{ConfigError, DecodeError, ModelError, NotifyError, PipelineError, ScoreError};
