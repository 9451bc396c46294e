//! simplebroker – named-queue broker over HTTP.
//
//  $ simplebroker --config simplebroker.toml
//  $ simplebroker --port 8080 --timeout 5 --max-queue-num 100
//  $ curl -X PUT localhost:8080/queue/jobs -d '{"message":"hello"}'
//  $ curl 'localhost:8080/queue/jobs?timeout=3'
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use simplebroker::api::{self, ApiState};
use simplebroker::config::{resolve_config, Overrides};
use simplebroker::logging::init_logging;
use simplebroker::shutdown::wait_for_signal;
use simplebroker::QueueManager;

#[derive(Debug, Parser)]
#[command(name = "simplebroker", version, about = "Named-queue message broker")]
struct Cli {
    /// Path to config TOML (falls back to $SIMPLEBROKER_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP port number
    #[arg(long)]
    port: Option<u16>,

    /// Default GET timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum number of queues
    #[arg(long)]
    max_queue_num: Option<usize>,

    /// Maximum number of messages in any queue
    #[arg(long)]
    max_message_num_per_queue: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            default_timeout_secs: self.timeout,
            max_queue_num: self.max_queue_num,
            max_messages_per_queue: self.max_message_num_per_queue,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut cfg = resolve_config(cli.config.as_deref())?;
    cfg.apply(&cli.overrides())?;
    cfg.validate()?;

    let manager = Arc::new(QueueManager::new(cfg.queue_manager_config()));
    let shutdown = CancellationToken::new();
    let state = ApiState {
        manager: Arc::clone(&manager),
        default_timeout: cfg.default_timeout(),
        shutdown: shutdown.clone(),
    };

    let listener = TcpListener::bind(cfg.bind_addr()?).await?;
    let server = tokio::spawn(api::serve(listener, state));

    wait_for_signal().await;
    info!("shutdown signal received; stopping broker");
    shutdown.cancel();
    manager.shutdown().await;

    match tokio::time::timeout(cfg.shutdown_timeout(), server).await {
        Ok(Ok(Ok(()))) => info!("shutdown complete"),
        Ok(Ok(Err(e))) => error!("HTTP server error: {e:#}"),
        Ok(Err(e)) => error!("HTTP server task failed: {e}"),
        Err(_) => warn!(
            "HTTP server did not stop within {:?}",
            cfg.shutdown_timeout()
        ),
    }
    Ok(())
}
