//! JSON Uplift Service Binary
//!
//! Serves the uplift pipeline over HTTP with structured logs, per-request
//! trace ids and graceful shutdown.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PORT`: Service port (default: 8000)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `SERVICE_NAME`: Name reported by `GET /` and in provenance
//! - `BACKEND_ROOT_PATH`: Prefix for every route
//! - `CORS_ALLOW_ORIGINS`: Comma-separated origins or `*`
//! - `REMOTE_FETCH_ALLOWED`: Regex, JSON string or JSON array of regexes
//! - `REMOTE_CONTEXT_FETCH_WHITELIST`: JSON array of allowed context URLs
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! REMOTE_FETCH_ALLOWED='https://data\.example\.org/.*' cargo run --bin json_uplift_service
//! ```

use std::net::SocketAddr;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use json_uplift::service::{cors_layer, create_router, request_logging_middleware, ServiceState};
use json_uplift::{BasicEngine, HttpFetcher, ServiceConfig};

const DEFAULT_LOG_FILTER: &str = "json_uplift_service=info,json_uplift=info,tower_http=info";

/// Install the global subscriber. `LOG_FORMAT=pretty` switches off JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("pretty"));
    let registry = tracing_subscriber::registry().with(filter);

    if pretty {
        registry
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        // One JSON object per line, fields flattened for Cloud Logging.
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Router with access logging, HTTP tracing and CORS around every route.
fn build_app(config: ServiceConfig, fetcher: HttpFetcher) -> Router {
    let cors = cors_layer(&config.cors);
    let engine = BasicEngine::for_service(&config.service_name);

    create_router(ServiceState::from_parts(config, engine, fetcher))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "Shutting down"),
        _ = terminate => info!(signal = "SIGTERM", "Shutting down"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(
        version = version,
        build_sha = option_env!("BUILD_SHA").unwrap_or("dev"),
        "Starting JSON Uplift Service"
    );

    let config = ServiceConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;
    config.log_summary();

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let service_name = config.service_name.clone();
    let root_path = config.root_path.clone().unwrap_or_else(|| "/".to_string());

    let fetcher = HttpFetcher::new(config.fetch_policy.clone())?;
    let app = build_app(config, fetcher);
    let listener = TcpListener::bind(addr).await?;

    info!(
        address = %addr,
        service = %service_name,
        root_path = %root_path,
        version = version,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}
