//! birdwire binary entry point.
//!
//! Opens a public filter stream tracking the comma-separated keywords in
//! `STREAM_TRACK` and prints every message as one JSON line on stdout until
//! Ctrl-C. All logs go to stderr.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::io::Write;
use std::sync::Arc;

use birdwire::config::Config;
use birdwire::error::AppError;
use birdwire::stream::{FilterStreamOptions, MessageMetadata, StreamConsumer};
use birdwire::transport::HttpExecutor;

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("birdwire starting...");

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }

    tracing::info!("birdwire shutdown complete");
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    tracing::info!(
        stream_base_url = %config.stream_base_url,
        timeout_ms = config.request_timeout_ms,
        "Configuration loaded"
    );

    let track: Vec<String> = std::env::var("STREAM_TRACK")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(String::from)
        .collect();
    if track.is_empty() {
        tracing::warn!("STREAM_TRACK is empty; the service may reject an unfiltered stream");
    }

    let executor = Arc::new(HttpExecutor::new(config.http_config())?);
    let consumer = StreamConsumer::new(executor, config.stream_config());
    let filter = FilterStreamOptions::new()
        .with_track(track)
        .with_stall_warnings(true);

    let connection = consumer.open_public_stream(
        &filter,
        |message: Option<serde_json::Value>, _metadata: &MessageMetadata| {
            if let Some(message) = message {
                let mut stdout = std::io::stdout().lock();
                if writeln!(stdout, "{message}").is_err() {
                    tracing::warn!("stdout closed");
                }
            }
        },
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!(connection_id = %connection.id(), "Cancelling stream");
            consumer.cancel(&connection);
        }
        () = connection.closed() => {}
    }

    let summary = connection.join().await?;
    tracing::info!(
        messages = summary.messages_dispatched,
        decode_failures = summary.decode_failures,
        reconnects = summary.reconnects,
        reason = ?summary.reason,
        "Stream closed"
    );
    Ok(())
}
