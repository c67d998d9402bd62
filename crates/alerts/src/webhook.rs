//! Discord webhook alert channel.

use crate::channel::{format_timestamp, AlertChannel, ChannelError};
use async_trait::async_trait;
use defiwatch_core::{AlertEvent, Severity};
use serde_json::json;
use std::time::Duration;
use tracing::warn;

const HIGH_COLOR: u32 = 0xff0000;
const MEDIUM_COLOR: u32 = 0xffff00;

/// Posts one Discord embed per alert event.
///
/// Posts are sequential; a failed post does not abort the remaining ones,
/// but any failure marks the whole batch as failed for counting purposes.
#[derive(Debug)]
pub struct WebhookChannel {
    url: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }

    fn embed(event: &AlertEvent) -> serde_json::Value {
        let color = match event.severity {
            Severity::High => HIGH_COLOR,
            Severity::Medium => MEDIUM_COLOR,
        };
        json!({
            "embeds": [{
                "title": format!("🚨 DeFi Alert: {}", event.protocol_name.to_uppercase()),
                "description": event.message,
                "color": color,
                "fields": [
                    {"name": "Type", "value": event.metric.as_str().to_uppercase(), "inline": true},
                    {"name": "Severity", "value": event.severity.as_str(), "inline": true},
                    {"name": "Time", "value": format_timestamp(event.detected_at_ms), "inline": false},
                ],
            }]
        })
    }

    async fn post(&self, event: &AlertEvent) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::embed(event))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, events: &[AlertEvent]) -> Result<(), ChannelError> {
        let mut failed = 0usize;
        for event in events {
            if let Err(e) = self.post(event).await {
                warn!(protocol = %event.protocol_id, error = %e, "webhook post failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(ChannelError::Partial {
                failed,
                total: events.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defiwatch_core::{Direction, MetricKind};

    fn event(severity: Severity) -> AlertEvent {
        AlertEvent {
            metric: MetricKind::Tvl,
            protocol_id: "lido".into(),
            protocol_name: "Lido".to_string(),
            severity,
            direction: Direction::Decreased,
            message: "📉 DECREASED by 25.00%!".to_string(),
            detected_at_ms: 0,
        }
    }

    #[test]
    fn test_embed_color_tracks_severity() {
        let high = WebhookChannel::embed(&event(Severity::High));
        let medium = WebhookChannel::embed(&event(Severity::Medium));
        assert_eq!(high["embeds"][0]["color"], HIGH_COLOR);
        assert_eq!(medium["embeds"][0]["color"], MEDIUM_COLOR);
    }

    #[test]
    fn test_embed_fields() {
        let embed = WebhookChannel::embed(&event(Severity::High));
        assert_eq!(embed["embeds"][0]["title"], "🚨 DeFi Alert: LIDO");
        assert_eq!(embed["embeds"][0]["fields"][0]["value"], "TVL");
        assert_eq!(embed["embeds"][0]["fields"][1]["value"], "HIGH");
    }

    #[tokio::test]
    async fn test_unreachable_webhook_reports_partial_failure() {
        let channel = WebhookChannel::new(
            "http://127.0.0.1:9/webhook".to_string(),
            Duration::from_millis(500),
        )
        .unwrap();

        let events = [event(Severity::High), event(Severity::Medium)];
        match channel.deliver(&events).await {
            Err(ChannelError::Partial { failed, total }) => {
                assert_eq!(failed, 2);
                assert_eq!(total, 2);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }
}
