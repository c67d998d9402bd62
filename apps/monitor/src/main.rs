//! DeFi Protocol Monitor - Headless Service
//!
//! Polls DefiLlama and CoinGecko for protocol TVL, token price and yield
//! data, raises threshold alerts and writes periodic reports.

mod config;
mod report;
mod state;

use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use defiwatch_alerts::{AlertDispatcher, AlertSecrets};
use defiwatch_engine::ThresholdDetector;
use defiwatch_feeds::SnapshotFetcher;
use report::ReportWriter;
use state::{MonitorStats, SnapshotStore};

/// DeFi Monitor CLI
#[derive(Parser, Debug)]
#[command(name = "defiwatch")]
#[command(about = "DeFi protocol TVL, price and yield monitor", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Poll interval in seconds (overrides the config file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Fetch one batch, print a report, and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// With --once: print the snapshot batch as JSON instead of a report
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

async fn run_once(config: &AppConfig, fetcher: &SnapshotFetcher, as_json: bool) {
    let snapshots = fetcher.fetch_all(&config.protocols).await;
    if as_json {
        match serde_json::to_string_pretty(&snapshots) {
            Ok(out) => println!("{out}"),
            Err(e) => error!("Failed to serialize snapshots: {}", e),
        }
    } else {
        println!("{}", report::render_text(&snapshots));
    }
}

async fn run_monitor(config: AppConfig, fetcher: SnapshotFetcher) {
    let mut detector = ThresholdDetector::new(config::detector_config(&config.alerts));
    let dispatcher = AlertDispatcher::from_settings(&config.alerts, &AlertSecrets::from_env());
    let store = SnapshotStore::new();
    let stats = MonitorStats::new();
    let writer = config.report.enabled.then(|| ReportWriter::new(&config.report));
    let interval = Duration::from_secs(config.poll_interval_secs);

    info!(
        "📡 Monitoring {} protocols every {}s across {} alert channels",
        config.protocols.len(),
        interval.as_secs(),
        dispatcher.channel_count()
    );

    loop {
        let snapshots = fetcher.fetch_all(&config.protocols).await;
        let cycle = stats.record_cycle(snapshots.len());
        store.update(&snapshots);

        let failed = snapshots.iter().filter(|s| s.error.is_some()).count();
        if failed > 0 {
            warn!("Cycle {}: {}/{} fetches failed", cycle, failed, snapshots.len());
        }

        let events = detector.check(&snapshots);
        if !events.is_empty() {
            info!("🚨 {} threshold alerts detected", events.len());
            let dispatch = dispatcher.dispatch(&events).await;
            stats.record_alerts(events.len(), dispatch.delivered);
        }

        if let Some(writer) = &writer {
            if cycle % config.report.every_cycles.max(1) == 0 {
                let latest = store.latest(&config.protocols);
                match writer.write(&latest) {
                    Ok(path) => info!("📝 Report written to {}", path.display()),
                    Err(e) => warn!("Failed to write report: {}", e),
                }
                if config.report.save_raw {
                    match writer.write_json(&latest) {
                        Ok(path) => info!("📝 Raw data written to {}", path.display()),
                        Err(e) => warn!("Failed to write raw data: {}", e),
                    }
                }
                let summary = stats.summary();
                info!(
                    "📊 Stats | Uptime: {}s | Cycles: {} | Snapshots: {} | Alerts: {} raised, {} delivered",
                    summary.uptime_secs,
                    summary.cycles,
                    summary.snapshots_fetched,
                    summary.alerts_raised,
                    summary.alerts_delivered
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Shutdown signal received");
                break;
            }
        }
    }

    let summary = stats.summary();
    info!("📈 Final Stats:");
    info!("  Total uptime: {} seconds", summary.uptime_secs);
    info!("  Poll cycles: {}", summary.cycles);
    info!("  Snapshots fetched: {}", summary.snapshots_fetched);
    info!("  Alerts raised: {}", summary.alerts_raised);
    info!("  Alerts delivered: {}", summary.alerts_delivered);
    info!("👋 DeFi Monitor stopped");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let (mut config, from_file) = match AppConfig::load_or_default(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to load config from {}: {}", args.config, e);
            return;
        }
    };
    if from_file {
        info!("Loaded configuration from {}", args.config);
    } else {
        info!("No config file at {}, using defaults", args.config);
    }

    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }

    let coingecko_api_key = std::env::var("COINGECKO_API_KEY")
        .ok()
        .filter(|v| !v.is_empty());
    let fetcher = match SnapshotFetcher::new(config.api.fetch_config(coingecko_api_key)) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build HTTP clients: {}", e);
            return;
        }
    };

    info!("🚀 DeFi Monitor starting...");

    if args.once {
        run_once(&config, &fetcher, args.json).await;
        return;
    }

    run_monitor(config, fetcher).await;
}
