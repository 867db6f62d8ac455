//! HTTP server setup and configuration.

use axum::Router;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::routes;
use crate::error::{Error, Result};
use crate::metrics::Exporter;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiServerConfig {
    /// Address to bind.
    pub listen_address: SocketAddr,
    /// Path serving the metrics.
    pub telemetry_path: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 9146)),
            telemetry_path: "/metrics".to_string(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Collector answering metrics requests
    pub exporter: Arc<Exporter>,
    /// Path the metrics are served under, linked from the landing page
    pub telemetry_path: Arc<str>,
}

impl AppState {
    pub fn new(exporter: Arc<Exporter>, telemetry_path: &str) -> Self {
        Self {
            exporter,
            telemetry_path: Arc::from(telemetry_path),
        }
    }
}

/// HTTP server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    /// Create a new server around `exporter`.
    pub fn new(config: ApiServerConfig, exporter: Arc<Exporter>) -> Self {
        let state = AppState::new(exporter, &config.telemetry_path);
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn config(&self) -> &ApiServerConfig {
        &self.config
    }

    /// Build the router with all middleware and routes.
    pub fn build_router(&self) -> Router {
        routes::create_router(self.state.clone()).layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let mut make_span =
                        tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::DEBUG);
                    use tower_http::trace::MakeSpan;
                    make_span.make_span(req)
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        let on_response = tower_http::trace::DefaultOnResponse::new()
                            .level(tracing::Level::DEBUG);
                        use tower_http::trace::OnResponse;
                        on_response.on_response(res, latency, span);
                    },
                ),
        )
    }

    /// Bind the configured listen address.
    ///
    /// Failing to bind is fatal: the exporter has no other way to be useful.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_address;
        TcpListener::bind(addr)
            .await
            .map_err(|e| Error::server(format!("Failed to bind to {}: {}", addr, e)))
    }

    /// Serve on an already bound listener until the cancel token fires.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let router = self.build_router();
        let addr = listener.local_addr()?;

        tracing::info!(
            "Listening on http://{}{}",
            addr,
            self.config.telemetry_path
        );

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("HTTP server shutting down...");
            })
            .await
            .map_err(|e| Error::server(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
