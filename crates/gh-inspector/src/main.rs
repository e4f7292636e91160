//! gh-inspector - GitHub repository health scoring
//!
//! `score` analyzes repositories from the command line, `serve` exposes the
//! same pipeline over HTTP and `cache clear` empties the persistent cache.

use chrono::Utc;
use clap::{Parser, Subcommand};
use gh_inspector::{
    format_records, start_server, Analyzer, Config, InspectorError, OutputFormat, Record, Result,
    ServerState, SharedState, StatsRecorder,
};
use github_client::GithubClient;
use repo_metrics::CancellationToken;
use repo_scoring::Scorer;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use ttl_kv_cache::{Cache, SqliteCache};

#[derive(Parser)]
#[command(name = "gh-inspector", version)]
#[command(about = "Score the health of GitHub repositories", long_about = None)]
struct Cli {
    /// Config file (default: ./configs/config.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more repositories
    Score {
        /// Comma-separated owner/name identifiers
        #[arg(short, long, value_delimiter = ',', required = true)]
        repos: Vec<String>,

        /// table, json, json-compact or csv
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Run the HTTP API
    Serve {
        /// Listen port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage the persistent cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("gh_inspector=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Score { repos, output } => {
            run_score(&config, repos, output.unwrap_or(config.output_format)).await
        }
        Commands::Serve { port } => run_serve(&config, port.unwrap_or(config.server.port)).await,
        Commands::Cache {
            action: CacheAction::Clear,
        } => clear_cache(&config).await,
    }
}

fn build_analyzer(config: &Config) -> Result<Analyzer> {
    let client = GithubClient::with_endpoint(
        config.github.endpoint.clone(),
        config.token()?,
        config.github_timeout(),
    )?;
    Ok(Analyzer::new(Arc::new(client), Scorer::new(config.weights())))
}

/// Open the cache if enabled. Failure degrades to running without one.
async fn open_cache(config: &Config) -> Option<Arc<SqliteCache>> {
    if !config.cache.enabled {
        info!("Cache disabled");
        return None;
    }

    match SqliteCache::open_with(config.cache_options()).await {
        Ok(cache) => {
            info!(path = %cache.path().display(), ttl_secs = config.cache.ttl, "Cache ready");
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!(error = %e, "Failed to open cache, continuing without it");
            None
        }
    }
}

async fn close_cache(cache: Option<Arc<SqliteCache>>) {
    if let Some(cache) = cache {
        if let Err(e) = cache.close().await {
            warn!(error = %e, "Failed to close cache");
        }
    }
}

async fn run_score(config: &Config, repos: Vec<String>, format: OutputFormat) -> Result<()> {
    let mut analyzer = build_analyzer(config)?;
    let cache = open_cache(config).await;
    if let Some(cache) = &cache {
        analyzer = analyzer.with_cache(cache.clone(), config.cache_ttl());
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling in-flight requests");
                cancel.cancel();
            }
        })
    };

    let report = analyzer.analyze_all(&cancel, &repos).await;
    interrupt.abort();

    for (repository, e) in report.errors() {
        error!(repository = %repository, error = %e, "Analysis failed");
    }

    let now = Utc::now();
    let records: Vec<Record> = report
        .repositories()
        .map(|attrs| Record::from_attributes(attrs, now))
        .collect();
    let rendered = format_records(&records, format)?;
    std::io::stdout().write_all(rendered.as_bytes())?;

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Analysis complete"
    );

    close_cache(cache).await;
    Ok(())
}

async fn run_serve(config: &Config, port: u16) -> Result<()> {
    let stats = Arc::new(StatsRecorder::new()?);
    let mut analyzer = build_analyzer(config)?.with_recorder(stats.clone());
    let cache = open_cache(config).await;
    if let Some(cache) = &cache {
        analyzer = analyzer.with_cache(cache.clone(), config.cache_ttl());
    }

    info!(
        port,
        request_timeout_secs = config.server.request_timeout,
        "Starting gh-inspector server"
    );

    let state: SharedState = Arc::new(ServerState::new(
        analyzer,
        stats.clone(),
        config.request_timeout(),
    ));
    start_server(state, port, shutdown_signal())
        .await
        .map_err(|e| InspectorError::Server(e.to_string()))?;

    close_cache(cache).await;
    let totals = stats.snapshot();
    info!(
        requests = totals.total_requests(),
        failed_requests = totals.failed_requests(),
        analyses_succeeded = totals.analyses_succeeded,
        analyses_failed = totals.analyses_failed,
        "Server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server runs until killed
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

async fn clear_cache(config: &Config) -> Result<()> {
    let cache = SqliteCache::open_with(config.cache_options()).await?;
    cache.clear().await?;
    cache.close().await?;
    info!(path = %config.cache_dir().display(), "Cache cleared");
    Ok(())
}
