//! asset-purge - delete retired assets from S3 and invalidate them in CloudFront
//!
//! Settings come from `appsettings.json`, `appsettings.local.json` and the
//! environment (see `purge_service::config`). Flags given here override them.
//!
//! Exit codes:
//! - 0: every target deleted/invalidated or already gone
//! - 1: at least one target was denied or failed
//! - 2: the run could not start (configuration, input, connection)

use anyhow::Context;
use clap::{Parser, ValueEnum};
use purge_service::clients::{
    load_sdk_config, CdnClient, CloudFrontClient, EdgeProbe, HttpEdgeProbe, ObjectStoreClient,
    S3StoreClient,
};
use purge_service::config::RuntimeConfig;
use purge_service::report::{ConsoleSink, ReportSink, TracingSink};
use purge_service::services::Capabilities;
use purge_service::source::{read_identifiers, DEFAULT_IDENTIFIER_FILE};
use purge_service::{execute, PurgeConfig, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "asset-purge", version)]
#[command(about = "Delete assets from S3 and invalidate their CloudFront cache")]
struct Args {
    /// File with one asset identifier per line (`#` starts a comment)
    #[arg(default_value = DEFAULT_IDENTIFIER_FILE)]
    identifiers: PathBuf,

    /// Directory holding appsettings.json and appsettings.local.json
    #[arg(long, env = "PURGE_SETTINGS_DIR", default_value = ".")]
    settings_dir: PathBuf,

    /// Print invalidation commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Number of identifiers processed in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Invalidate every path without checking the edge first
    #[arg(long)]
    no_edge_check: bool,

    /// One invalidation request per identifier instead of per path
    #[arg(long)]
    batch: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Human-readable lines on stdout
    Console,
    /// Structured log events only
    Log,
}

impl Args {
    fn apply(&self, runtime: &mut RuntimeConfig) {
        if self.dry_run {
            runtime.dry_run = true;
        }
        if let Some(concurrency) = self.concurrency {
            runtime.concurrency = concurrency.max(1);
        }
        if self.no_edge_check {
            runtime.gate_on_edge_presence = false;
        }
        if self.batch {
            runtime.batch_invalidations = true;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(summary) if summary.has_problems() => {
            error!(problems = summary.problems(), "Purge finished with problems");
            ExitCode::from(1)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Purge aborted");
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("asset_purge=info,purge_service=info,resilience=warn"));

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(args: Args) -> anyhow::Result<RunSummary> {
    let mut config = PurgeConfig::load(&args.settings_dir).context("loading configuration")?;
    args.apply(&mut config.runtime);

    let identifiers = read_identifiers(&args.identifiers)?;
    info!(
        bucket = %config.storage.bucket,
        identifiers = identifiers.len(),
        secondary = config.secondary_enabled(),
        cdn = config.cdn_enabled(),
        dry_run = config.runtime.dry_run,
        "Configuration loaded"
    );

    let sdk_config = load_sdk_config(&config.storage).await;
    let store: Arc<dyn ObjectStoreClient> = Arc::new(S3StoreClient::from_sdk_config(&sdk_config));
    let cdn: Option<Arc<dyn CdnClient>> = if config.cdn_enabled() {
        Some(Arc::new(CloudFrontClient::from_sdk_config(&sdk_config)) as Arc<dyn CdnClient>)
    } else {
        None
    };
    let probe: Arc<dyn EdgeProbe> = Arc::new(
        HttpEdgeProbe::with_timeout(config.runtime.call_timeout).context("building HTTP client")?,
    );

    // Ctrl-C stops new identifiers from starting; in-flight ones finish
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, finishing in-flight identifiers");
            let _ = shutdown_tx.send(true);
        }
    });

    let sink: Box<dyn ReportSink> = match args.report {
        ReportFormat::Console => Box::new(ConsoleSink::for_config(&config)),
        ReportFormat::Log => Box::new(TracingSink),
    };

    let summary = execute(
        &config,
        &identifiers,
        Capabilities { store, cdn, probe },
        sink.as_ref(),
        shutdown_rx,
    )
    .await?;

    Ok(summary)
}
