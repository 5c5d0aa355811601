//! sidetree-observer - Ingests anchored DID operation batches from a ledger and CAS

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sidetree_observer::clients::{HttpLedgerClient, IpfsCasClient};
use sidetree_observer::config::Config;
use sidetree_observer::protocol::{ProtocolParameters, ProtocolVersionManager, ProtocolVersions};
use sidetree_observer::storage::SqliteStore;
use sidetree_observer::traits::{CasClient, LedgerClient};
use sidetree_observer::Observer;

#[derive(Parser, Debug)]
#[command(name = "sidetree-observer")]
#[command(about = "Ingests anchored DID operation batches from a ledger and CAS")]
struct Args {
    /// Path to SQLite database
    #[arg(long, env = "SIDETREE_DATABASE_PATH", default_value = "./sidetree.db")]
    database: String,

    /// Base URL of the ledger service
    #[arg(long, env = "SIDETREE_LEDGER_URL")]
    ledger_url: Option<String>,

    /// Base URL of the IPFS HTTP API
    #[arg(long, env = "SIDETREE_IPFS_URL")]
    ipfs_url: Option<String>,

    /// JSON file listing protocol versions
    #[arg(long, env = "SIDETREE_VERSIONS_FILE")]
    versions_file: Option<String>,

    /// Seconds between observation cycles
    #[arg(long, env = "SIDETREE_OBSERVER_INTERVAL_SECS")]
    interval_secs: Option<u64>,

    /// Run a single observation cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(long, env = "SIDETREE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sidetree-observer v{}", env!("CARGO_PKG_VERSION"));

    // CLI flags win over environment-only settings
    let mut config = Config::from_env();
    config.sqlite.path = args.database;
    if let Some(url) = args.ledger_url {
        config.ledger.base_url = url;
    }
    if let Some(url) = args.ipfs_url {
        config.ipfs.base_url = url;
    }
    if let Some(file) = args.versions_file {
        config.versions_file = Some(file);
    }
    if let Some(secs) = args.interval_secs {
        config.observer.interval_secs = secs;
    }

    let versions = match &config.versions_file {
        Some(path) => ProtocolVersions::from_json_file(path)
            .with_context(|| format!("loading protocol versions from {}", path))?,
        None => ProtocolVersions::single(ProtocolParameters::default()),
    };
    tracing::info!(versions = versions.versions().len(), "Protocol versions loaded");

    let store = Arc::new(SqliteStore::with_config(config.sqlite.clone()).context("opening database")?);
    tracing::info!(path = %config.sqlite.path, "Database opened");

    let ledger: Arc<dyn LedgerClient> =
        Arc::new(HttpLedgerClient::new(config.ledger.clone()).context("creating ledger client")?);
    let cas: Arc<dyn CasClient> =
        Arc::new(IpfsCasClient::new(config.ipfs.clone()).context("creating IPFS client")?);
    tracing::info!(
        ledger_url = %config.ledger.base_url,
        ipfs_url = %config.ipfs.base_url,
        "Clients configured"
    );

    let version_manager = ProtocolVersionManager::new(
        Arc::new(versions),
        Arc::clone(&ledger),
        cas,
        store.clone(),
        store.clone(),
    );

    let mut observer = Observer::new(
        ledger,
        Arc::new(version_manager),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        config.observer.clone(),
    );

    if args.once {
        observer.process_once().await?;
        observer.settle().await?;
        tracing::info!("Single observation cycle complete");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let handle = tokio::spawn(async move {
        observer.run(shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());

    handle.await.context("observer task panicked")?;
    tracing::info!("sidetree-observer stopped");

    Ok(())
}
