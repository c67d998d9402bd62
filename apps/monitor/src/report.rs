//! Snapshot report rendering and file output.

use std::path::PathBuf;

use chrono::Utc;
use defiwatch_core::fmt::{format_opt, Unit};
use defiwatch_core::Snapshot;

use crate::config::{ReportFormat, ReportSettings};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Report output errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize snapshot data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render a fixed-width console report for a snapshot batch.
pub fn render_text(snapshots: &[Snapshot]) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push_str("\nDeFi Monitor Report\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "Generated: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for snapshot in snapshots {
        out.push('\n');
        out.push_str(&format!("Protocol: {}\n", snapshot.name));
        out.push_str(THIN_RULE);
        out.push('\n');
        out.push_str(&format!(
            "  TVL:           {}\n",
            format_opt(snapshot.tvl_usd, Unit::Usd)
        ));
        out.push_str(&format!(
            "  TVL 24h:       {}\n",
            format_opt(snapshot.tvl_change_24h_pct, Unit::SignedPercent)
        ));
        out.push_str(&format!(
            "  Price:         {}\n",
            format_opt(snapshot.price_usd, Unit::UsdExact)
        ));
        out.push_str(&format!(
            "  Price 24h:     {}\n",
            format_opt(snapshot.price_change_24h_pct, Unit::SignedPercent)
        ));
        out.push_str(&format!(
            "  APY:           {}\n",
            format_opt(snapshot.apy_pct, Unit::Percent)
        ));
        out.push_str(&format!(
            "  Market Cap:    {}\n",
            format_opt(snapshot.market_cap_usd, Unit::Usd)
        ));
        if let Some(error) = &snapshot.error {
            out.push_str(&format!("  Error:         {error}\n"));
        }
    }

    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Render a markdown report for a snapshot batch.
pub fn render_markdown(snapshots: &[Snapshot]) -> String {
    let mut out = String::new();
    out.push_str("# DeFi Protocol Monitoring Report\n\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Protocols monitored: {}\n\n", snapshots.len()));
    out.push_str("## Protocol Details\n");

    for (idx, snapshot) in snapshots.iter().enumerate() {
        out.push_str(&format!("\n### {}. {}\n\n", idx + 1, snapshot.name));
        out.push_str(&format!(
            "- **TVL:** {}\n",
            format_opt(snapshot.tvl_usd, Unit::Usd)
        ));
        out.push_str(&format!(
            "- **TVL Change (24h):** {}\n",
            format_opt(snapshot.tvl_change_24h_pct, Unit::SignedPercent)
        ));
        out.push_str(&format!(
            "- **Token Price:** {}\n",
            format_opt(snapshot.price_usd, Unit::UsdExact)
        ));
        out.push_str(&format!(
            "- **Price Change (24h):** {}\n",
            format_opt(snapshot.price_change_24h_pct, Unit::SignedPercent)
        ));
        out.push_str(&format!(
            "- **APY:** {}\n",
            format_opt(snapshot.apy_pct, Unit::Percent)
        ));
        out.push_str(&format!(
            "- **Market Cap:** {}\n",
            format_opt(snapshot.market_cap_usd, Unit::Usd)
        ));
        if let Some(error) = &snapshot.error {
            out.push_str(&format!("- **Error:** {error}\n"));
        }
    }

    out
}

/// Writes timestamped report files into a target directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new(settings: &ReportSettings) -> Self {
        Self {
            dir: PathBuf::from(&settings.dir),
            format: settings.format,
        }
    }

    /// Write a rendered report, returning the path of the new file.
    pub fn write(&self, snapshots: &[Snapshot]) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format("%Y%m%d_%H%M");
        let (rendered, ext) = match self.format {
            ReportFormat::Text => (render_text(snapshots), "txt"),
            ReportFormat::Markdown => (render_markdown(snapshots), "md"),
        };
        let path = self.dir.join(format!("defi_report_{stamp}.{ext}"));
        std::fs::write(&path, rendered)?;
        Ok(path)
    }

    /// Dump the raw snapshot batch as pretty-printed JSON.
    pub fn write_json(&self, snapshots: &[Snapshot]) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("defi_data_{stamp}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(snapshots)?)?;
        Ok(path)
    }
}
