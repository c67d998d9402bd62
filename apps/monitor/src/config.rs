//! Application configuration.

use std::path::Path;
use std::time::Duration;

use defiwatch_alerts::AlertSettings;
use defiwatch_core::ProtocolSpec;
use defiwatch_engine::DetectorConfig;
use defiwatch_feeds::FetchConfig;
use serde::{Deserialize, Serialize};

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Protocols to monitor.
    pub protocols: Vec<ProtocolSpec>,
    /// Upstream API settings.
    pub api: ApiSettings,
    /// Alerting settings (thresholds and channel toggles).
    pub alerts: AlertSettings,
    /// Report output settings.
    pub report: ReportSettings,
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            protocols: ProtocolSpec::default_registry(),
            api: ApiSettings::default(),
            alerts: AlertSettings::default(),
            report: ReportSettings::default(),
            poll_interval_secs: 300,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub fn load_or_default(path: &str) -> Result<(Self, bool), ConfigError> {
        if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)?;
            Ok((serde_json::from_str(&raw)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Override for the DefiLlama base URL.
    pub defillama_base_url: Option<String>,
    /// Override for the CoinGecko base URL.
    pub coingecko_base_url: Option<String>,
    /// DefiLlama requests per minute.
    pub defillama_rate_limit: u32,
    /// CoinGecko requests per minute.
    pub coingecko_rate_limit: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Cooldown after an HTTP 429 before the single retry, in seconds.
    pub rate_limit_cooldown_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        let base = FetchConfig::default();
        Self {
            defillama_base_url: None,
            coingecko_base_url: None,
            defillama_rate_limit: base.defillama_rate_limit,
            coingecko_rate_limit: base.coingecko_rate_limit,
            request_timeout_secs: base.request_timeout.as_secs(),
            rate_limit_cooldown_secs: base.rate_limit_cooldown.as_secs(),
        }
    }
}

impl ApiSettings {
    /// Build a [`FetchConfig`], injecting the CoinGecko API key from the
    /// environment when present.
    pub fn fetch_config(&self, coingecko_api_key: Option<String>) -> FetchConfig {
        let mut config = FetchConfig::default();
        config.defillama_base_url = self.defillama_base_url.clone();
        config.coingecko_base_url = self.coingecko_base_url.clone();
        config.coingecko_api_key = coingecko_api_key;
        config.defillama_rate_limit = self.defillama_rate_limit;
        config.coingecko_rate_limit = self.coingecko_rate_limit;
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config.rate_limit_cooldown = Duration::from_secs(self.rate_limit_cooldown_secs);
        config
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Whether periodic report files are written.
    pub enabled: bool,
    /// Output directory for report files.
    pub dir: String,
    /// Write a report every N poll cycles.
    pub every_cycles: u64,
    /// Report file format.
    pub format: ReportFormat,
    /// Also dump the raw snapshot batch as JSON alongside each report.
    pub save_raw: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "reports".to_string(),
            every_cycles: 12,
            format: ReportFormat::Text,
            save_raw: true,
        }
    }
}

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Markdown,
}

/// Map alert settings onto the detector's thresholds.
pub fn detector_config(settings: &AlertSettings) -> DetectorConfig {
    DetectorConfig {
        enabled: settings.enabled,
        price_threshold_pct: settings.price_change_threshold,
        tvl_threshold_pct: settings.tvl_change_threshold,
        apy_threshold_pts: settings.apy_change_threshold,
    }
}
