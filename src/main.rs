//! Request Admission Gateway
//!
//! A small HTTP gateway built with Tokio and Axum that fronts an
//! application with request admission control.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │               ADMISSION GATEWAY               │
//!                    │                                              │
//!  Client Request    │  ┌─────────┐   ┌───────────┐   ┌──────────┐ │
//!  ──────────────────┼─▶│  http   │──▶│ admission │──▶│   app    │ │
//!                    │  │ server  │   │  filter   │   │  routes  │ │
//!                    │  └─────────┘   └─────┬─────┘   └────┬─────┘ │
//!                    │                      │429           │       │
//!  Client Response   │  ┌──────────┐        ▼              │       │
//!  ◀─────────────────┼──│ security │◀───────┴──────────────┘       │
//!                    │  │ headers  │                               │
//!                    │  └──────────┘                               │
//!                    │                                              │
//!                    │  ┌────────────────────────────────────────┐ │
//!                    │  │          Cross-Cutting Concerns         │ │
//!                    │  │  config │ sweeper │ observability │     │ │
//!                    │  │         │         │ lifecycle     │     │ │
//!                    │  └────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use axum::{routing::get, Json, Router};
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use admission_gateway::config::{load_config, ConfigWatcher, GatewayConfig};
use admission_gateway::lifecycle::{signals, Shutdown};
use admission_gateway::observability::{logging, metrics};
use admission_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "admission-gateway")]
#[command(about = "HTTP gateway with fixed-window request admission", long_about = None)]
struct Args {
    /// Path to the TOML configuration file (defaults apply when absent).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("admission-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        window_ms = config.admission.window_ms,
        max_requests = config.admission.max_requests,
        path_prefix = %config.admission.path_prefix,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Watch the config file so admission limits can be tuned without a
    // restart. Without a config file there is nothing to watch.
    let (_watcher, _config_tx, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), None, updates)
        }
        None => {
            let (tx, updates) = mpsc::unbounded_channel();
            (None, Some(tx), updates)
        }
    };

    // Translate OS signals into the internal shutdown broadcast.
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config, application_router());
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Stand-in application routes.
///
/// The real page rendering and API surface live outside this crate; the
/// gateway only fronts them. These routes exist so the binary serves
/// something observable out of the box.
fn application_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(api_status))
}

async fn health() -> &'static str {
    "OK"
}

async fn api_status() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
