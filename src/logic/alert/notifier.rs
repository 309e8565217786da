//! Notifier contract and the built-in notifiers

use std::sync::Arc;

use super::types::AnomalyEvent;
use crate::logic::error::NotifyError;

/// Consumer of anomaly events. Called from the notification dispatcher,
/// never from the scoring loop itself.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &AnomalyEvent) -> Result<(), NotifyError>;

    fn name(&self) -> &str {
        "notifier"
    }
}

// ============================================================================
// LOG NOTIFIER
// ============================================================================

/// Writes each anomaly to the log at `warn`
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &AnomalyEvent) -> Result<(), NotifyError> {
        log::warn!("[ANOMALY DETECTED] {}", event.summary());
        for (field, value) in event.sample.fields.iter().zip(event.sample.values.iter()) {
            log::debug!("   {} = {}", field, value);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

// ============================================================================
// CLOSURE NOTIFIER
// ============================================================================

pub struct FnNotifier<F> {
    name: String,
    func: F,
}

impl<F> FnNotifier<F>
where
    F: Fn(&AnomalyEvent) -> Result<(), NotifyError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Notifier for FnNotifier<F>
where
    F: Fn(&AnomalyEvent) -> Result<(), NotifyError> + Send + Sync,
{
    fn notify(&self, event: &AnomalyEvent) -> Result<(), NotifyError> {
        (self.func)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// FAN-OUT
// ============================================================================

/// Delivers to every notifier; reports the first failure after trying all
#[derive(Default)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Notifier for NotifierSet {
    fn notify(&self, event: &AnomalyEvent) -> Result<(), NotifyError> {
        let mut first_error = None;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(event) {
                log::error!("Notifier '{}' failed: {}", notifier.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn name(&self) -> &str {
        "set"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ingest::Sample;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_tries_every_notifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let set = NotifierSet::new()
            .with(Arc::new(FnNotifier::new("broken", |_: &AnomalyEvent| {
                Err(NotifyError::Delivery("down".into()))
            })))
            .with(Arc::new(FnNotifier::new("counter", move |_: &AnomalyEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })))
            .with(Arc::new(LogNotifier));

        let event = AnomalyEvent::new(Arc::new(Sample::from_values(vec![1.0])), 2.0, 1.0);
        let result = set.notify(&event);

        assert!(matches!(result, Err(NotifyError::Delivery(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(set.len(), 3);
    }
}
