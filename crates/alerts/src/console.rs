//! Console alert channel.

use crate::channel::{format_timestamp, AlertChannel, ChannelError};
use async_trait::async_trait;
use defiwatch_core::AlertEvent;

/// Writes the alert batch to stdout as a banner block. Infallible.
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn new() -> Self {
        Self
    }

    fn render(events: &[AlertEvent]) -> String {
        let rule = "=".repeat(60);
        let mut out = format!("\n{rule}\n🚨 ALERTS TRIGGERED\n{rule}\n");
        for event in events {
            out.push_str(&format!(
                "\n[{}] {} - {}\n{}\nTime: {}\n",
                event.severity.as_str(),
                event.protocol_name.to_uppercase(),
                event.metric.as_str().to_uppercase(),
                event.message,
                format_timestamp(event.detected_at_ms),
            ));
        }
        out.push_str(&format!("{rule}\n"));
        out
    }
}

#[async_trait]
impl AlertChannel for ConsoleChannel {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn deliver(&self, events: &[AlertEvent]) -> Result<(), ChannelError> {
        println!("{}", Self::render(events));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defiwatch_core::{Direction, MetricKind, Severity};

    fn event() -> AlertEvent {
        AlertEvent {
            metric: MetricKind::Price,
            protocol_id: "aave".into(),
            protocol_name: "Aave V3".to_string(),
            severity: Severity::High,
            direction: Direction::Decreased,
            message: "📉 DECREASED by 12.00%!\nPrevious: $100.0000\nCurrent: $88.0000"
                .to_string(),
            detected_at_ms: 0,
        }
    }

    #[test]
    fn test_render_contains_severity_and_protocol() {
        let text = ConsoleChannel::render(&[event()]);
        assert!(text.contains("[HIGH] AAVE V3 - PRICE"));
        assert!(text.contains("DECREASED by 12.00%"));
        assert!(text.contains("1970-01-01"));
    }

    #[tokio::test]
    async fn test_deliver_never_fails() {
        let channel = ConsoleChannel::new();
        assert!(channel.deliver(&[event()]).await.is_ok());
    }
}
