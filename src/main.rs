//! Convention tracker CLI.
//! `scrape` produces the published snapshot; `check` and `watch` are the
//! client side (diff against the local cache, notify about additions).

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use convention_tracker::cache::{ClientCache, FileKvStore};
use convention_tracker::change_detector::{run_watch, RefreshOutcome, Refresher};
use convention_tracker::config::AppConfig;
use convention_tracker::html::DocumentFetcher;
use convention_tracker::ingest::config::load_manual_default;
use convention_tracker::ingest::providers::{default_adapters, fixture_adapters};
use convention_tracker::ingest::scheduler::{spawn_scrape_scheduler, ScrapeSchedulerCfg};
use convention_tracker::ingest::run_scrape;
use convention_tracker::metrics::Metrics;
use convention_tracker::notify::NotifierMux;
use convention_tracker::remote::source_for;
use convention_tracker::snapshot::SnapshotStore;

/// Supernatural convention tracker
///
/// Examples:
///   convention-tracker scrape --out data/conventions.json
///   convention-tracker scrape --fixtures tests/fixtures --metrics-out state/metrics.prom
///   convention-tracker check
///   convention-tracker watch
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape every site and write the snapshot
    Scrape {
        /// Snapshot output path (default from config)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Keep running, re-scraping every SECS seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,

        /// Read `<site>.html` documents from DIR instead of the network
        #[arg(long, value_name = "DIR")]
        fixtures: Option<PathBuf>,

        /// Write Prometheus exposition text here after the run
        #[arg(long, value_name = "FILE")]
        metrics_out: Option<PathBuf>,
    },
    /// Run one client refresh and print new conventions as JSON
    Check,
    /// Refresh periodically; press Enter to refresh now
    Watch,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = AppConfig::load()?;

    match cli.command {
        Command::Scrape {
            out,
            every,
            fixtures,
            metrics_out,
        } => scrape(&cfg, out, every, fixtures, metrics_out).await,
        Command::Check => check(&cfg).await,
        Command::Watch => watch(&cfg).await,
    }
}

async fn scrape(
    cfg: &AppConfig,
    out: Option<PathBuf>,
    every: Option<u64>,
    fixtures: Option<PathBuf>,
    metrics_out: Option<PathBuf>,
) -> Result<()> {
    let metrics = match metrics_out {
        Some(path) => Some((Metrics::init()?, path)),
        None => None,
    };

    let adapters = match &fixtures {
        Some(dir) => fixture_adapters(dir)?,
        None => default_adapters(&DocumentFetcher::new(&cfg.fetch_config())?),
    };
    let manual = load_manual_default()?;
    let store = SnapshotStore::new(out.unwrap_or_else(|| cfg.snapshot_path.clone()));

    if let Some(secs) = every {
        tracing::info!(target: "ingest", interval_secs = secs, path = %store.path().display(), "scrape scheduler started");
        let handle = spawn_scrape_scheduler(
            ScrapeSchedulerCfg { interval_secs: secs },
            adapters,
            manual,
            store,
        );
        tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
        handle.abort();
    } else {
        let snap = run_scrape(&adapters, &manual, &store).await?;
        tracing::info!(
            target: "ingest",
            count = snap.count,
            path = %store.path().display(),
            "snapshot written"
        );
    }

    if let Some((m, path)) = metrics {
        m.write_to(&path).await?;
    }
    Ok(())
}

fn build_refresher(cfg: &AppConfig) -> Result<Refresher> {
    let remote = source_for(&cfg.snapshot_url, cfg.fetch_timeout_secs)?;
    let cache = ClientCache::new(Arc::new(FileKvStore::new(&cfg.cache_path)));
    let notifier = Arc::new(NotifierMux::with_webhooks(cfg.notifications_enabled));
    tracing::debug!(target: "notify", channels = ?notifier.channel_names(), "notifier ready");

    let mut refresher = Refresher::new(remote, cache, notifier);
    if let Some(baseline) = &cfg.baseline_path {
        refresher = refresher.with_baseline(SnapshotStore::new(baseline));
    }
    Ok(refresher)
}

async fn check(cfg: &AppConfig) -> Result<()> {
    let refresher = build_refresher(cfg)?;
    let additions = match refresher.refresh().await {
        RefreshOutcome::Refreshed { additions, .. } => additions,
        RefreshOutcome::Fallback { conventions, reason } => {
            tracing::warn!(target: "refresh", reason = %reason, shown = conventions.len(), "offline, nothing new");
            Vec::new()
        }
        RefreshOutcome::Skipped => Vec::new(),
    };
    println!("{}", serde_json::to_string_pretty(&additions)?);
    Ok(())
}

async fn watch(cfg: &AppConfig) -> Result<()> {
    let refresher = Arc::new(build_refresher(cfg)?);
    let (tx, rx) = mpsc::channel::<()>(4);

    // Enter on stdin = pull-to-refresh. Blocking read lives on its own thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.blocking_send(()).is_err() {
                break;
            }
        }
    });

    tracing::info!(
        target: "refresh",
        interval_secs = cfg.refresh_interval_secs,
        source = %cfg.snapshot_url,
        "watching (press Enter to refresh now, Ctrl-C to stop)"
    );
    run_watch(
        refresher,
        Duration::from_secs(cfg.refresh_interval_secs),
        rx,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await;
    Ok(())
}
