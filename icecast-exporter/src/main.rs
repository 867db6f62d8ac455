use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;
use tracing::{info, warn};

use icecast_exporter::{
    api::ApiServer,
    client::StatusClient,
    config::Args,
    logging::init_logging,
    metrics::{Exporter, process_start_time},
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    process_start_time();
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format)?;

    let config = args.into_config()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        scrape_uri = %config.scrape_uri,
        timeout = ?config.timeout,
        "Starting icecast-exporter"
    );

    let client = StatusClient::new(config.scrape_uri.clone(), config.timeout)?;
    let exporter = Arc::new(Exporter::new(Arc::new(client)));
    let server = ApiServer::new(config.server, exporter);

    let listener = server.bind().await?;

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        let signal = shutdown_signal().await;
        info!("Received {}, terminating", signal);
        cancel_token.cancel();
    });

    server.serve(listener).await?;
    Ok(())
}

/// Wait for SIGINT or SIGTERM and return the signal's name.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
