//! Webhook Alert Notifier
//!
//! POSTs each anomaly as JSON to a configured URL.

use std::time::Duration;

use super::notifier::Notifier;
use super::types::AnomalyEvent;
use crate::logic::error::NotifyError;

pub struct WebhookNotifier {
    url: String,
    agent: ureq::Agent,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            url: url.into(),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request body for one event
    pub fn format_payload(event: &AnomalyEvent) -> serde_json::Value {
        serde_json::json!({
            "type": "SENSOR_ANOMALY",
            "id": event.id,
            "title": "Sensor anomaly detected",
            "message": event.summary(),
            "score": event.score,
            "threshold": event.threshold,
            "excess_ratio": event.excess_ratio(),
            "detected_at": event.detected_at.to_rfc3339(),
            "hostname": event.hostname,
            "origin": event.sample.origin.map(|a| a.to_string()),
            "sample": {
                "id": event.sample.id,
                "received_at": event.sample.received_at.to_rfc3339(),
                "fields": event.sample.fields,
                "values": event.sample.values,
            },
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: &AnomalyEvent) -> Result<(), NotifyError> {
        let body = Self::format_payload(event).to_string();

        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&body);

        match response {
            Ok(resp) => {
                log::info!("Alert sent to {} ({})", self.url, resp.status());
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to send alert to {}: {}", self.url, e);
                Err(NotifyError::Delivery(e.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ingest::Sample;
    use std::sync::Arc;

    #[test]
    fn test_payload_contains_readings() {
        let sample = Sample::new(
            vec!["temp_j1".into(), "payload".into()],
            vec![81.5, 2.0],
            Some("10.0.0.7:40112".parse().unwrap()),
        );
        let event = AnomalyEvent::new(Arc::new(sample), 0.31, 0.12);

        let payload = WebhookNotifier::format_payload(&event);
        assert_eq!(payload["type"], "SENSOR_ANOMALY");
        assert_eq!(payload["origin"], "10.0.0.7:40112");
        assert_eq!(payload["sample"]["fields"][0], "temp_j1");
        assert_eq!(payload["sample"]["values"][0], 81.5);
    }

    #[test]
    fn test_unreachable_endpoint_is_delivery_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/hook", port);
        let notifier = WebhookNotifier::new(url, Duration::from_millis(500));
        let event = AnomalyEvent::new(Arc::new(Sample::from_values(vec![1.0])), 2.0, 1.0);
        assert!(matches!(notifier.notify(&event), Err(NotifyError::Delivery(_))));
    }
}
