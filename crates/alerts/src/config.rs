//! Alert configuration types.

use serde::{Deserialize, Serialize};

/// Alerting configuration, the `alerts` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Master switch for threshold detection and delivery.
    pub enabled: bool,
    /// Price change threshold in percent.
    pub price_change_threshold: f64,
    /// TVL change threshold in percent.
    pub tvl_change_threshold: f64,
    /// APY change threshold in absolute percentage points.
    pub apy_change_threshold: f64,
    /// Console channel.
    pub console: bool,
    /// Discord webhook channel; also needs DISCORD_WEBHOOK_URL in the env.
    pub discord_webhook: bool,
    /// Email channel; also needs full credentials in the env.
    pub email: bool,
    /// SMTP relay host for the email channel.
    pub smtp_server: String,
    /// SMTP relay port (STARTTLS).
    pub smtp_port: u16,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            price_change_threshold: 5.0,
            tvl_change_threshold: 10.0,
            apy_change_threshold: 1.0,
            console: true,
            discord_webhook: false,
            email: false,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
        }
    }
}

/// Delivery credentials, loaded from the environment rather than the config
/// file so they stay out of version control.
#[derive(Debug, Clone, Default)]
pub struct AlertSecrets {
    /// DISCORD_WEBHOOK_URL
    pub webhook_url: Option<String>,
    /// ALERT_EMAIL (recipient)
    pub email_to: Option<String>,
    /// ALERT_EMAIL_FROM (sender)
    pub email_from: Option<String>,
    /// SMTP_USERNAME
    pub smtp_username: Option<String>,
    /// SMTP_PASSWORD
    pub smtp_password: Option<String>,
}

impl AlertSecrets {
    /// Read credentials from environment variables; empty values count as
    /// unset.
    pub fn from_env() -> Self {
        fn non_empty(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        }

        Self {
            webhook_url: non_empty("DISCORD_WEBHOOK_URL"),
            email_to: non_empty("ALERT_EMAIL"),
            email_from: non_empty("ALERT_EMAIL_FROM"),
            smtp_username: non_empty("SMTP_USERNAME"),
            smtp_password: non_empty("SMTP_PASSWORD"),
        }
    }

    /// True if every field the email channel needs is present.
    pub fn email_complete(&self) -> bool {
        self.email_to.is_some()
            && self.email_from.is_some()
            && self.smtp_username.is_some()
            && self.smtp_password.is_some()
    }
}
