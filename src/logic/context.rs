//! Pipeline context
//!
//! Built once at startup and shared by `Arc` with the listener, every
//! connection handler and the analysis loop. Nothing in it changes after
//! construction except the buffer contents and the counters.

use std::sync::Arc;

use super::alert::Notifier;
use super::config::PipelineConfig;
use super::ingest::{SampleBuffer, SampleDecoder};
use super::model::{Scorer, Threshold};
use super::stats::PipelineStats;

pub struct PipelineContext {
    pub config: PipelineConfig,
    pub buffer: Arc<SampleBuffer>,
    pub decoder: SampleDecoder,
    pub scorer: Arc<dyn Scorer>,
    pub threshold: Threshold,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub stats: Arc<PipelineStats>,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, scorer: Arc<dyn Scorer>, threshold: Threshold) -> Self {
        let buffer = Arc::new(SampleBuffer::new(config.buffer_capacity));
        let decoder = SampleDecoder::new(config.feature_layout.clone(), config.ignored_fields.clone());

        Self {
            config,
            buffer,
            decoder,
            scorer,
            threshold,
            notifier: None,
            stats: Arc::new(PipelineStats::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}
