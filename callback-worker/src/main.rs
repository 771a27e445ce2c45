//! Ingestion callback worker binary.
//!
//! Runs the queue consumer and the health endpoint side by side until
//! SIGINT/SIGTERM, then lets the consumer finish its current message.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;

use ingestion_callback::cli::{parse_listen_addr, Cli, Command};
use ingestion_callback::{
    telemetry, web, AppContext, Consumer, ConsumerDeps, ConsumerSettings, HttpCallbackSender,
    ProtobufDecoder, S3Reader, SqsQueue,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.dev);

    match &cli.command {
        Command::Server { port } => serve(&cli, port).await,
    }
}

async fn serve(cli: &Cli, port: &str) -> Result<()> {
    info!(config_paths = ?cli.config, "reading_config");
    let config = cli.load_config()?;
    info!(
        queue = %config.sqs.queue_name,
        bucket = %config.s3.bucket,
        callback_timeout_secs = config.callback.timeout_secs,
        poll_interval_ms = config.consumer.poll_interval_ms,
        "config_loaded"
    );

    let addr = parse_listen_addr(port).with_context(|| format!("Invalid listen address '{port}'"))?;
    let ctx = AppContext::from_config(config).await?;

    let queue = Arc::new(SqsQueue::new(&ctx));
    let deps = ConsumerDeps {
        poller: queue.clone(),
        acker: queue.clone(),
        fetcher: Arc::new(S3Reader::new(&ctx)),
        decoder: Arc::new(ProtobufDecoder),
        sender: Arc::new(HttpCallbackSender::new(&ctx)),
    };
    let settings = ConsumerSettings::from_config(&ctx.config.consumer);

    let consumer = Consumer::connect(queue.as_ref(), &ctx.config.sqs.queue_name, deps, settings)
        .await
        .context("Failed to resolve queue url")?;

    let shutdown = CancellationToken::new();
    let consumer_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { consumer.run(shutdown).await }
    });

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!(address = %addr, "health_server_listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, web::router())
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {}
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    consumer_task.await.context("Consumer task panicked")?;

    info!("server_shutdown_complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let received = wait_for_signal().await;
    info!(signal = received, "shutdown_signal_received");
}

/// Wait for SIGINT or SIGTERM and name the one that arrived.
async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
