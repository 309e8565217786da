//! Robot Telemetry Core
//!
//! Real-time sensor anomaly pipeline: producers stream newline-delimited JSON
//! readings over TCP, the most recent samples are kept in a bounded window,
//! and the freshest sample is continuously scored against a threshold.

pub mod constants;
pub mod logic;

pub use logic::alert::{AnomalyEvent, LogNotifier, Notifier, NotifierSet, WebhookNotifier};
pub use logic::ingest::{Sample, SampleBuffer};
pub use logic::model::{OnnxScorer, Scorer, Threshold};
pub use logic::{Controller, PipelineConfig, PipelineContext, PipelineError};
