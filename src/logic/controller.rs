//! Pipeline Controller - start/stop of listener, analysis loop and dispatcher
//!
//! `start` and `stop` are idempotent: calling either in the wrong state logs a
//! warning and does nothing. Only a bind failure is reported to the caller.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::alert::{run_dispatcher, EventQueue};
use super::analysis_loop::run_processor;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::ingest::{run_listener, SampleBuffer};
use super::stats::StatsSnapshot;

struct RunningPipeline {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

pub struct Controller {
    ctx: Arc<PipelineContext>,
    running: AtomicBool,
    lifecycle: Mutex<Option<RunningPipeline>>,
    local_addr: RwLock<Option<SocketAddr>>,
}

impl Controller {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(None),
            local_addr: RwLock::new(None),
        }
    }

    /// Bind the listener and spawn the pipeline tasks
    pub async fn start(&self) -> Result<(), PipelineError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            log::warn!("Pipeline already running!");
            return Ok(());
        }

        let addr = self.ctx.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| PipelineError::Bind { addr, source })?;
        let local = listener.local_addr().unwrap_or(addr);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let (queue, receiver) =
            EventQueue::channel(self.ctx.config.event_queue_capacity, Arc::clone(&self.ctx.stats));

        let listener_task = tokio::spawn(run_listener(
            listener,
            Arc::clone(&self.ctx),
            shutdown_rx.clone(),
        ));
        let processor_task = tokio::spawn(run_processor(Arc::clone(&self.ctx), queue, shutdown_rx));
        let dispatcher_task = tokio::spawn(run_dispatcher(
            receiver,
            self.ctx.notifier.clone(),
            self.ctx.config.notify_timeout,
            Arc::clone(&self.ctx.stats),
        ));

        *lifecycle = Some(RunningPipeline {
            shutdown,
            tasks: vec![
                ("listener", listener_task),
                ("analysis", processor_task),
                ("dispatcher", dispatcher_task),
            ],
        });
        *self.local_addr.write() = Some(local);
        self.running.store(true, Ordering::SeqCst);

        log::info!(
            "Pipeline started on {} (buffer: {}, threshold: {}, features: {})",
            local,
            self.ctx.buffer.capacity(),
            self.ctx.threshold,
            match self.ctx.decoder.layout() {
                Some(layout) => layout.join(","),
                None => "wire order".to_string(),
            }
        );
        Ok(())
    }

    /// Signal shutdown and wait (bounded) for the tasks to finish
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.take() else {
            log::warn!("Pipeline not running!");
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        let _ = running.shutdown.send(true);

        let deadline = tokio::time::Instant::now() + self.ctx.config.stop_timeout;
        for (name, mut handle) in running.tasks {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => log::debug!("{} task finished", name),
                Ok(Err(e)) => log::error!("{} task failed: {}", name, e),
                Err(_) => {
                    log::warn!(
                        "{} task did not stop within {:?}, aborting",
                        name,
                        self.ctx.config.stop_timeout
                    );
                    handle.abort();
                }
            }
        }

        *self.local_addr.write() = None;
        log::info!("Pipeline stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address actually bound (differs from config when binding port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn buffer(&self) -> Arc<SampleBuffer> {
        Arc::clone(&self.ctx.buffer)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.ctx.stats.snapshot()
    }
}
