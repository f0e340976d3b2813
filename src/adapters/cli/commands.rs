//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the pump.fun launch watcher.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use crate::adapters::alerts::{BrowserLinkOpener, NoopLinkOpener, TracingNotifier};
use crate::adapters::pump_fun::{decode_frame, find_available_url, HealthChecker, WebSocketTransport};
use crate::application::{
    AlertSettings, ConnectionConfig, ConnectionManager, FeedUpdate, IngestionCoordinator,
};
use crate::config::{load_config, Config};
use crate::domain::error::{FeedError, SkipReason};
use crate::ports::alerts::LinkOpener;

use super::console::{format_event, format_search, ConsoleObserver};

/// PumpAlert - pump.fun launch watcher
#[derive(Parser, Debug)]
#[command(
    name = "pump-alert",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch pump.fun token launches and alert on name matches",
    long_about = "PumpAlert streams new token launches from pump.fun, keeps a bounded \
                  history of what it has seen, and alerts when a token name matches \
                  one of your search terms."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream live launches and alert on matches
    Watch(WatchCmd),

    /// Run recorded frames (one JSON object per line) through the matcher
    Replay(ReplayCmd),

    /// Check the pump.fun API and stream endpoint
    Health(HealthCmd),
}

/// Live monitoring
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Comma-separated search terms (overrides config)
    #[arg(short, long, value_name = "TERMS")]
    pub terms: Option<String>,

    /// Match every token
    #[arg(short, long, conflicts_with = "terms")]
    pub all: bool,

    /// Do not reconnect after the stream closes
    #[arg(long)]
    pub no_reconnect: bool,

    /// Open matched tokens in the browser
    #[arg(long)]
    pub open_links: bool,

    /// Print every received token, not just matches
    #[arg(long)]
    pub show_all: bool,
}

/// Offline replay of recorded frames
#[derive(Parser, Debug)]
pub struct ReplayCmd {
    /// File of frames, one per line ("-" or omitted reads stdin)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Comma-separated search terms (overrides config)
    #[arg(short, long, value_name = "TERMS")]
    pub terms: Option<String>,

    /// Match every token
    #[arg(short, long, conflicts_with = "terms")]
    pub all: bool,

    /// Print the final store snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Endpoint health check
#[derive(Parser, Debug)]
pub struct HealthCmd {
    /// Stream urls to probe in order (defaults to the configured url)
    #[arg(long = "ws-url", value_name = "URL")]
    pub ws_urls: Vec<String>,
}

/// Counts from a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub decoded: usize,
    pub skipped: usize,
    pub new_matches: usize,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = match &app.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Watch(cmd) => watch_command(cmd, &config).await,
        Command::Replay(cmd) => replay_command(cmd, &config).await,
        Command::Health(cmd) => health_command(cmd, &config).await,
    }
}

/// Initialize logging system. RUST_LOG wins, then the flags, then the config level.
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Search input from the flags, falling back to the config
pub fn resolve_search_input<'a>(terms: Option<&'a str>, all: bool, config: &'a Config) -> &'a str {
    if all {
        ""
    } else {
        terms.unwrap_or_else(|| config.search.search_input())
    }
}

fn build_coordinator(config: &Config, open_links: bool) -> IngestionCoordinator {
    let mut alerts = AlertSettings::from(&config.alerts);
    alerts.open_links |= open_links;

    let link_opener: Arc<dyn LinkOpener> = if alerts.open_links {
        Arc::new(BrowserLinkOpener::new())
    } else {
        Arc::new(NoopLinkOpener)
    };

    IngestionCoordinator::new(config.store.build_store(), Arc::new(TracingNotifier), link_opener)
        .with_alerts(alerts)
}

/// Handle watch command
async fn watch_command(cmd: WatchCmd, config: &Config) -> Result<()> {
    let mut coordinator = build_coordinator(config, cmd.open_links);
    let search = coordinator
        .prepare_search(resolve_search_input(cmd.terms.as_deref(), cmd.all, config))
        .context("Invalid search terms")?
        .clone();
    coordinator.subscribe(Arc::new(ConsoleObserver::new(cmd.show_all)));

    let mut conn_config = ConnectionConfig::from(config);
    if cmd.no_reconnect {
        conn_config.auto_reconnect = false;
    }

    println!("Watching pump.fun launches");
    println!("  Endpoint: {}", conn_config.ws_url);
    println!("  Search: {}", format_search(&search));
    println!("  Reconnect: {}", if conn_config.auto_reconnect { "on" } else { "off" });

    let transport = WebSocketTransport::new(config.feed.connect_timeout());
    let (manager, handle, updates) = ConnectionManager::new(conn_config, transport);
    let manager_task = tokio::spawn(manager.run());

    handle.connect().await.context("Connection manager stopped early")?;

    // Setup Ctrl+C handler
    let ctrl = handle.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        if let Err(e) = ctrl.shutdown().await {
            debug!("Shutdown not delivered: {}", e);
        }
    });

    let result = coordinator.run(updates).await;

    if let Err(e) = handle.shutdown().await {
        debug!("Connection manager already stopped: {}", e);
    }
    match manager_task.await.context("Connection manager task failed")? {
        Ok(()) => {}
        Err(e) if e.is_recoverable() => warn!("Connection manager ended with error: {}", e),
        Err(e) => debug!("Connection manager stopped: {}", e),
    }

    let store = coordinator.store();
    println!(
        "\nSeen {} tokens, {} matched",
        store.all_seen().len(),
        store.matched().len()
    );

    match result {
        Ok(()) => Ok(()),
        Err(FeedError::RetriesExhausted { attempts }) => bail!(
            "Gave up after {} connection attempts; check your network and run watch again",
            attempts
        ),
        Err(e) => Err(e.into()),
    }
}

/// Feed recorded frames through the coordinator
pub async fn replay_frames(
    coordinator: &mut IngestionCoordinator,
    input: &str,
    max_frame_bytes: usize,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
        summary.frames += 1;

        let decoded = if line.len() > max_frame_bytes {
            Err(SkipReason::Oversized(line.len()))
        } else {
            decode_frame(line)
        };

        match decoded {
            Ok(event) => {
                summary.decoded += 1;
                let before = coordinator.store().matched().len();
                coordinator.handle_update(FeedUpdate::Event(event)).await?;
                if coordinator.store().matched().len() > before {
                    summary.new_matches += 1;
                }
            }
            Err(reason) => {
                summary.skipped += 1;
                debug!("Skipped frame {}: {}", summary.frames, reason);
            }
        }
    }

    Ok(summary)
}

/// Handle replay command
async fn replay_command(cmd: ReplayCmd, config: &Config) -> Result<()> {
    let input = match cmd.input.as_ref().filter(|p| p.as_os_str() != "-") {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read frames from stdin")?;
            buf
        }
    };

    let mut coordinator = build_coordinator(config, false);
    coordinator
        .prepare_search(resolve_search_input(cmd.terms.as_deref(), cmd.all, config))
        .context("Invalid search terms")?;
    if !cmd.json {
        coordinator.subscribe(Arc::new(ConsoleObserver::new(false)));
    }

    let summary = replay_frames(&mut coordinator, &input, config.feed.max_frame_bytes).await?;

    if cmd.json {
        let snapshot = serde_json::to_string_pretty(&coordinator.snapshot())
            .context("Failed to serialize snapshot")?;
        println!("{}", snapshot);
        return Ok(());
    }

    println!(
        "\nReplayed {} frames: {} events, {} skipped, {} new matches",
        summary.frames, summary.decoded, summary.skipped, summary.new_matches
    );
    for event in coordinator.store().recent().iter() {
        println!("  {}", format_event(event));
    }
    Ok(())
}

/// Handle health command
async fn health_command(cmd: HealthCmd, config: &Config) -> Result<()> {
    let checker = HealthChecker::new(config.health.api_url.clone(), config.health.timeout())
        .context("Failed to create health checker")?;

    let api = checker.check_api_health().await;
    println!(
        "API ({}): {} - {}",
        checker.api_url(),
        if api.is_healthy { "healthy" } else { "unhealthy" },
        api.message
    );

    let urls = if cmd.ws_urls.is_empty() {
        vec![config.feed.get_ws_url()]
    } else {
        cmd.ws_urls
    };

    let transport = WebSocketTransport::new(config.feed.connect_timeout());
    let stream = find_available_url(&transport, &urls, config.feed.connect_timeout()).await;
    match &stream {
        Some(url) => println!("Stream: available at {}", url),
        None => println!("Stream: unavailable ({} url(s) tried)", urls.len()),
    }

    if !api.is_healthy && stream.is_none() {
        bail!("pump.fun is unreachable");
    }
    Ok(())
}
