//! Notification dispatcher
//!
//! The analysis loop hands events to a bounded queue and moves on. A separate
//! task drains the queue and calls the notifier on the blocking pool with a
//! per-call timeout, so a slow or broken notifier can never stall scoring.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::notifier::Notifier;
use super::types::AnomalyEvent;
use crate::logic::error::NotifyError;
use crate::logic::stats::PipelineStats;

/// Producer side of the notification queue
#[derive(Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<AnomalyEvent>,
    stats: Arc<PipelineStats>,
}

impl EventQueue {
    /// Create a queue and the receiver the dispatcher task consumes
    pub fn channel(
        capacity: usize,
        stats: Arc<PipelineStats>,
    ) -> (Self, mpsc::Receiver<AnomalyEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, stats }, receiver)
    }

    /// Enqueue without waiting. Returns `false` when the event was dropped.
    pub fn push(&self, event: AnomalyEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.stats.notification_dropped();
                log::warn!("Notification queue full, dropping event {}", event.id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.stats.notification_dropped();
                log::debug!("Notification queue closed, dropping event {}", event.id);
                false
            }
        }
    }
}

/// Drain the queue until every `EventQueue` handle is gone
pub async fn run_dispatcher(
    mut receiver: mpsc::Receiver<AnomalyEvent>,
    notifier: Option<Arc<dyn Notifier>>,
    timeout: Duration,
    stats: Arc<PipelineStats>,
) {
    log::debug!("Notification dispatcher started");

    while let Some(event) = receiver.recv().await {
        let Some(notifier) = notifier.as_ref() else {
            continue;
        };

        match deliver(Arc::clone(notifier), event, timeout).await {
            Ok(()) => stats.notification_sent(),
            Err(e) => {
                stats.notification_failed();
                log::error!("Notifier '{}' failed: {}", notifier.name(), e);
            }
        }
    }

    log::debug!("Notification dispatcher stopped");
}

async fn deliver(
    notifier: Arc<dyn Notifier>,
    event: AnomalyEvent,
    timeout: Duration,
) -> Result<(), NotifyError> {
    let call = tokio::task::spawn_blocking(move || notifier.notify(&event));

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(NotifyError::Panicked(join_error.to_string())),
        Err(_) => Err(NotifyError::Timeout(timeout.as_millis() as u64)),
    }
}
