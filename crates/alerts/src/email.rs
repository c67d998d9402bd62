//! Email alert channel.

use crate::channel::{format_timestamp, AlertChannel, ChannelError};
use async_trait::async_trait;
use defiwatch_core::AlertEvent;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Sends the whole alert batch as a single plain-text email over SMTP
/// with STARTTLS.
pub struct EmailChannel {
    from: String,
    to: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for EmailChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailChannel")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl EmailChannel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        smtp_server: &str,
        smtp_port: u16,
        username: String,
        password: String,
        from: String,
        to: String,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_server)?
            .port(smtp_port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(timeout))
            .build();

        Ok(Self { from, to, transport })
    }

    fn render_body(events: &[AlertEvent]) -> String {
        let rule = "=".repeat(60);
        let mut body = String::from("The following alerts were triggered:\n");
        for event in events {
            body.push_str(&format!(
                "\n{rule}\n[{}] {} - {}\n{}\nTime: {}\n",
                event.severity.as_str(),
                event.protocol_name.to_uppercase(),
                event.metric.as_str().to_uppercase(),
                event.message,
                format_timestamp(event.detected_at_ms),
            ));
        }
        body
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, events: &[AlertEvent]) -> Result<(), ChannelError> {
        let subject = format!(
            "🚨 DeFi Monitor Alerts - {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M")
        );
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(self.to.parse()?)
            .subject(subject)
            .body(Self::render_body(events))?;

        self.transport.send(message).await?;
        Ok(())
    }
}
