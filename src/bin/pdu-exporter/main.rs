mod args;

use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use pdu_exporter::{exporter::Exporter, fetcher::PduClient, metrics::PduMetrics, server};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let metrics = Arc::new(PduMetrics::new().context("failed to declare metrics")?);

    let client = PduClient::new(
        &args.pdu_address,
        args.pdu_port,
        Duration::from_secs(args.pdu_request_timeout),
    )
    .context("failed to create PDU client")?;

    let listener = TcpListener::bind((args.listen_address, args.listen_port))
        .await
        .with_context(|| {
            format!(
                "failed to bind metrics listener: {}:{}",
                args.listen_address, args.listen_port
            )
        })?;
    info!(
        "serving metrics on {}, polling {}",
        listener.local_addr()?,
        client.url()
    );

    let server = tokio::spawn(server::serve(listener, Arc::clone(&metrics)));

    let exporter = Exporter::new(
        client,
        metrics,
        Duration::from_secs(args.polling_interval_seconds),
    );

    tokio::select! {
        () = exporter.run() => Ok(()),
        res = server => res.context("metrics server task failed")?,
    }
}
