//! chainwatch daemon: entry point for serving or driving the discovery engine.

mod config;
mod console;

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use chainwatch_client::{ChainClient, JsonRpcClient};
use chainwatch_engine::{
    Backend, CachingStrategy, Composition, ExecutionStrategy, StrategyComposer,
};
use chainwatch_rpc::{AppState, RpcServer};
use chainwatch_store_lmdb::LmdbEnvironment;
use chainwatch_utils::LogFormat;

use crate::config::AppConfig;
use crate::console::Console;

#[derive(Parser)]
#[command(name = "chainwatch", about = "Transaction discovery for subscribed addresses")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and environment variables override them.
    #[arg(long, env = "CHAINWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the chain node.
    #[arg(long, env = "CHAINWATCH_RPC_URL")]
    rpc_url: Option<String>,

    /// Caching strategy: "releasing" or "greedy".
    #[arg(long, env = "CHAINWATCH_CACHING")]
    caching: Option<CachingStrategy>,

    /// Execution strategy: "sequential" or "concurrent".
    #[arg(long, env = "CHAINWATCH_EXECUTION")]
    execution: Option<ExecutionStrategy>,

    /// Storage backend: "memory" or "ttl-store".
    #[arg(long, env = "CHAINWATCH_BACKEND")]
    backend: Option<Backend>,

    /// Worker pool width for concurrent execution.
    #[arg(long, env = "CHAINWATCH_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Directory of the ttl-store backend.
    #[arg(long, env = "CHAINWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level or filter directive, e.g. "info" or "chainwatch_engine=debug".
    #[arg(long, env = "CHAINWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output: "human" or "json".
    #[arg(long, env = "CHAINWATCH_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP surface.
    Serve {
        /// Listen address, e.g. "0.0.0.0:8080".
        #[arg(long, env = "CHAINWATCH_LISTEN")]
        listen: Option<SocketAddr>,
    },
    /// Interactive console on stdin/stdout.
    Console,
}

impl Cli {
    /// Layer flag and environment overrides on top of the file config.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.rpc_url {
            config.chain.rpc_url = url.clone();
        }
        if let Some(caching) = self.caching {
            config.engine.caching = caching;
        }
        if let Some(execution) = self.execution {
            config.engine.execution = execution;
        }
        if let Some(backend) = self.backend {
            config.engine.backend = backend;
        }
        if let Some(concurrency) = self.concurrency {
            config.engine.concurrency = concurrency;
        }
        if let Some(dir) = &self.data_dir {
            config.ttl_store_config_mut().path = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Command::Serve {
            listen: Some(listen),
        } = self.command
        {
            config.http.listen = listen;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);

    chainwatch_utils::init_logging(config.logging.format, &config.logging.level)
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    // The blocking HTTP client owns an internal runtime, so it is built
    // (and later dropped) outside the tokio runtime.
    let chain: Arc<dyn ChainClient> = Arc::new(
        JsonRpcClient::new(config.client_config()).context("failed to build chain client")?,
    );
    let composition = StrategyComposer::new(config.engine_config())
        .compose(chain)
        .context("failed to compose discovery engine")?;

    let result = match cli.command {
        Command::Serve { .. } => serve(&config, &composition),
        Command::Console => {
            let stdin = io::stdin();
            Console::new(composition.engine.clone(), stdin.lock(), io::stdout())
                .run()
                .context("console i/o failed")
        }
    };

    tracing::info!("chainwatch exited");
    result
}

fn serve(config: &AppConfig, composition: &Composition) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("chainwatch-http")
        .build()
        .context("failed to start tokio runtime")?;

    let mut state = AppState::new(composition.engine.clone());
    if config.http.metrics {
        state = state.with_metrics(composition.metrics.clone());
    }
    let server = RpcServer::new(config.http.listen, state);

    runtime.block_on(async {
        if let Some(env) = &composition.ttl_env {
            let interval = Duration::from_secs(config.maintenance.purge_interval_secs.max(1));
            tokio::spawn(purge_loop(env.clone(), interval));
        }

        tracing::info!(
            listen = %config.http.listen,
            caching = composition.engine.caching(),
            execution = composition.engine.execution(),
            "starting chainwatch"
        );
        server.start(shutdown_signal()).await
    })?;

    runtime.shutdown_timeout(Duration::from_secs(5));
    Ok(())
}

/// Periodically drop expired ttl-store records.
async fn purge_loop(env: Arc<LmdbEnvironment>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let env = env.clone();
        match tokio::task::spawn_blocking(move || env.purge_expired()).await {
            Ok(Ok(purged)) => tracing::debug!(purged, "expired records swept"),
            Ok(Err(e)) => tracing::warn!(error = %e, "expiry sweep failed"),
            Err(e) => tracing::warn!(error = %e, "expiry sweep task failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
