//! Analysis Loop - scores the freshest sample
//!
//! Each cycle looks at the newest sample only. Samples pushed while a score
//! is in flight are skipped in favour of whatever is newest next time round;
//! no sample is scored twice. With nothing new the loop parks until a push
//! (bounded by the idle interval) or shutdown.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use super::alert::{AnomalyEvent, EventQueue};
use super::context::PipelineContext;
use super::error::ScoreError;
use super::ingest::Sample;
use super::model::{score_checked, Scorer};

pub async fn run_processor(
    ctx: Arc<PipelineContext>,
    events: EventQueue,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!(
        "Analysis loop started (scorer: {}, threshold: {})",
        ctx.scorer.name(),
        ctx.threshold
    );

    let mut last_seq = 0u64;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let Some((seq, sample)) = ctx.buffer.latest_since(last_seq) else {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ctx.buffer.wait_for_push(ctx.config.idle_interval) => {}
            }
            continue;
        };
        last_seq = seq;

        let started = Instant::now();
        match score_sample(Arc::clone(&ctx.scorer), Arc::clone(&sample)).await {
            Ok(error) => {
                ctx.stats.sample_scored(started.elapsed());

                if ctx.threshold.is_exceeded_by(error) {
                    ctx.stats.anomaly();
                    let event = AnomalyEvent::new(sample, error, ctx.threshold.value());
                    log::info!("Anomaly {}: {}", event.id, event.summary());
                    events.push(event);
                } else {
                    log::debug!("Sample {} error {:.6} within threshold", sample.id, error);
                }
            }
            Err(e) => {
                ctx.stats.score_failure();
                log::warn!("Error processing sample {}: {}", sample.id, e);
            }
        }
    }

    log::info!("Analysis loop stopped");
}

/// Score on the blocking pool; a panicking scorer becomes a `ScoreError`
async fn score_sample(scorer: Arc<dyn Scorer>, sample: Arc<Sample>) -> Result<f32, ScoreError> {
    tokio::task::spawn_blocking(move || score_checked(scorer.as_ref(), sample.features()))
        .await
        .map_err(|e| ScoreError::Panicked(e.to_string()))?
}
