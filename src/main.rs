//! Robot Telemetry - Main Entry Point

use std::sync::Arc;

use anyhow::Context;

use robot_telemetry_core::constants::{APP_NAME, APP_VERSION};
use robot_telemetry_core::logic::alert::{LogNotifier, NotifierSet, WebhookNotifier};
use robot_telemetry_core::logic::model::{OnnxScorer, Threshold};
use robot_telemetry_core::logic::{Controller, PipelineConfig, PipelineContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let config = PipelineConfig::from_env().context("invalid configuration")?;
    let threshold = Threshold::resolve(&config).context("failed to resolve threshold")?;
    let scorer = Arc::new(OnnxScorer::from_config(&config).context("failed to load anomaly model")?);
    let metadata = scorer.metadata();
    log::info!(
        "Model {} ({} features, sha256 {})",
        metadata.model_path,
        metadata.features,
        metadata.sha256
    );

    let mut notifiers = NotifierSet::new().with(Arc::new(LogNotifier));
    if let Some(url) = config.webhook_url.clone() {
        log::info!("Webhook alerts enabled: {}", url);
        notifiers = notifiers.with(Arc::new(WebhookNotifier::new(url, config.notify_timeout)));
    }

    let ctx = PipelineContext::new(config, scorer.clone(), threshold)
        .with_notifier(Arc::new(notifiers));
    let controller = Controller::new(ctx);

    controller.start().await.context("failed to start pipeline")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    log::info!("Shutting down...");
    controller.stop().await;

    let stats = controller.stats();
    log::info!(
        "Final stats: {}",
        serde_json::to_string(&stats).unwrap_or_else(|_| format!("{:?}", stats))
    );

    let buffer = controller.buffer().status();
    log::info!(
        "Buffer: {}/{} samples, {} pushed, {} evicted",
        buffer.current_size,
        buffer.capacity,
        buffer.total_pushed,
        buffer.evicted
    );

    let engine = scorer.status();
    log::info!(
        "Inference: {} runs, avg {:.3} ms on {}",
        engine.inference_count,
        engine.avg_latency_ms,
        engine.inference_device
    );
    Ok(())
}
