//! Alert Module - anomaly events and their delivery

pub mod dispatcher;
pub mod notifier;
pub mod types;
pub mod webhook;

pub use dispatcher::{run_dispatcher, EventQueue};
pub use notifier::{FnNotifier, LogNotifier, Notifier, NotifierSet};
pub use types::AnomalyEvent;
pub use webhook::WebhookNotifier;
