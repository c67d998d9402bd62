//! Alert fan-out with per-channel failure isolation.

use crate::channel::{AlertChannel, DeliveryOutcome, DeliveryResult};
use crate::config::{AlertSecrets, AlertSettings};
use crate::console::ConsoleChannel;
use crate::email::EmailChannel;
use crate::webhook::WebhookChannel;
use defiwatch_core::AlertEvent;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Aggregated result of one dispatch call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Tagged per-channel outcomes, in channel order.
    pub outcomes: Vec<DeliveryOutcome>,
    /// Total delivery attempts that succeeded: the sum of the batch length
    /// over fully successful channels. The same event delivered through two
    /// channels counts twice.
    pub delivered: usize,
}

/// Fans a batch of alert events out to the configured channels.
///
/// Stateless per call; channels succeed or fail independently and no
/// failure escapes `dispatch`.
pub struct AlertDispatcher {
    channels: Vec<Box<dyn AlertChannel>>,
    delivery_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Box<dyn AlertChannel>>) -> Self {
        Self {
            channels,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Build the dispatcher from configuration, skipping enabled channels
    /// whose credentials are incomplete.
    pub fn from_settings(settings: &AlertSettings, secrets: &AlertSecrets) -> Self {
        let mut channels: Vec<Box<dyn AlertChannel>> = Vec::new();

        if settings.console {
            channels.push(Box::new(ConsoleChannel::new()));
        }

        if settings.discord_webhook {
            match &secrets.webhook_url {
                Some(url) => match WebhookChannel::new(url.clone(), DEFAULT_DELIVERY_TIMEOUT) {
                    Ok(channel) => channels.push(Box::new(channel)),
                    Err(e) => warn!(error = %e, "failed to build webhook channel, skipping"),
                },
                None => {
                    warn!("webhook alerts enabled but DISCORD_WEBHOOK_URL is not set, skipping")
                }
            }
        }

        if settings.email {
            if secrets.email_complete() {
                // email_complete() guarantees every field is present
                let built = EmailChannel::new(
                    &settings.smtp_server,
                    settings.smtp_port,
                    secrets.smtp_username.clone().unwrap_or_default(),
                    secrets.smtp_password.clone().unwrap_or_default(),
                    secrets.email_from.clone().unwrap_or_default(),
                    secrets.email_to.clone().unwrap_or_default(),
                    DEFAULT_DELIVERY_TIMEOUT,
                );
                match built {
                    Ok(channel) => channels.push(Box::new(channel)),
                    Err(e) => warn!(error = %e, "failed to build email channel, skipping"),
                }
            } else {
                warn!("email alerts enabled but credentials are incomplete, skipping");
            }
        }

        Self::new(channels)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver a batch through every channel.
    ///
    /// An empty batch performs no I/O. Each channel runs inside a bounded
    /// timeout; an expired timeout is that channel's failure.
    pub async fn dispatch(&self, events: &[AlertEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();
        if events.is_empty() {
            return report;
        }

        for channel in &self.channels {
            let result =
                match tokio::time::timeout(self.delivery_timeout, channel.deliver(events)).await {
                    Ok(Ok(())) => {
                        info!(channel = channel.name(), count = events.len(), "alerts delivered");
                        report.delivered += events.len();
                        DeliveryResult::Delivered(events.len())
                    }
                    Ok(Err(e)) => {
                        warn!(channel = channel.name(), error = %e, "alert delivery failed");
                        DeliveryResult::Failed(e.to_string())
                    }
                    Err(_) => {
                        warn!(
                            channel = channel.name(),
                            timeout_secs = self.delivery_timeout.as_secs(),
                            "alert delivery timed out"
                        );
                        DeliveryResult::Failed(format!(
                            "timed out after {:?}",
                            self.delivery_timeout
                        ))
                    }
                };

            report.outcomes.push(DeliveryOutcome {
                channel: channel.name(),
                result,
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use async_trait::async_trait;
    use defiwatch_core::{Direction, MetricKind, Severity};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeChannel {
        name: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AlertChannel for FakeChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn deliver(&self, _events: &[AlertEvent]) -> Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                Err(ChannelError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    struct StalledChannel;

    #[async_trait]
    impl AlertChannel for StalledChannel {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn deliver(&self, _events: &[AlertEvent]) -> Result<(), ChannelError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn events(n: usize) -> Vec<AlertEvent> {
        (0..n)
            .map(|i| AlertEvent {
                metric: MetricKind::Price,
                protocol_id: format!("proto-{i}").into(),
                protocol_name: format!("Protocol {i}"),
                severity: Severity::Medium,
                direction: Direction::Increased,
                message: "📈 INCREASED by 6.00%!".to_string(),
                detected_at_ms: 0,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_performs_no_io() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(vec![Box::new(FakeChannel {
            name: "console",
            fail: false,
            calls: Arc::clone(&calls),
        })]);

        let report = dispatcher.dispatch(&[]).await;
        assert_eq!(report.delivered, 0);
        assert_eq!(report.outcomes, vec![]);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let console_calls = Arc::new(AtomicUsize::new(0));
        let webhook_calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(vec![
            Box::new(FakeChannel {
                name: "console",
                fail: false,
                calls: Arc::clone(&console_calls),
            }),
            Box::new(FakeChannel {
                name: "webhook",
                fail: true,
                calls: Arc::clone(&webhook_calls),
            }),
        ]);

        let report = dispatcher.dispatch(&events(4)).await;

        // console contributes 4, the failing webhook contributes 0
        assert_eq!(report.delivered, 4);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].result, DeliveryResult::Delivered(4));
        assert!(matches!(report.outcomes[1].result, DeliveryResult::Failed(_)));
        assert_eq!(console_calls.load(Ordering::Relaxed), 1);
        assert_eq!(webhook_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_two_successful_channels_count_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(vec![
            Box::new(FakeChannel {
                name: "console",
                fail: false,
                calls: Arc::clone(&calls),
            }),
            Box::new(FakeChannel {
                name: "webhook",
                fail: false,
                calls: Arc::clone(&calls),
            }),
        ]);

        let report = dispatcher.dispatch(&events(3)).await;
        assert_eq!(report.delivered, 6);
    }

    #[tokio::test]
    async fn test_stalled_channel_times_out_as_failure() {
        let dispatcher = AlertDispatcher::new(vec![Box::new(StalledChannel)])
            .with_timeout(Duration::from_millis(50));

        let report = dispatcher.dispatch(&events(1)).await;
        assert_eq!(report.delivered, 0);
        assert!(matches!(report.outcomes[0].result, DeliveryResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_disabled_channels_are_not_built() {
        let settings = AlertSettings {
            console: false,
            discord_webhook: true, // no URL in secrets -> skipped
            email: true,           // incomplete credentials -> skipped
            ..AlertSettings::default()
        };
        let dispatcher = AlertDispatcher::from_settings(&settings, &AlertSecrets::default());
        assert_eq!(dispatcher.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_console_channel_built_by_default() {
        let dispatcher =
            AlertDispatcher::from_settings(&AlertSettings::default(), &AlertSecrets::default());
        assert_eq!(dispatcher.channel_count(), 1);
    }
}
