//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tokio::sync::mpsc;

use admission_gateway::config::GatewayConfig;
use admission_gateway::lifecycle::Shutdown;
use admission_gateway::{HttpServer, WindowRegistry};

/// A gateway running on an ephemeral port with handles for the test.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub config_tx: mpsc::UnboundedSender<GatewayConfig>,
    #[allow(dead_code)]
    pub registry: Arc<WindowRegistry>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Spawn a gateway fronting a tiny stand-in app (`/health`, `/api/echo`).
pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/echo", get(|| async { Json(json!({ "echo": true })) }));

    let server = HttpServer::new(config, app);
    let registry = server.registry();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGateway {
        addr,
        shutdown,
        config_tx,
        registry,
    }
}

/// Non-pooled client so every request hits the gateway fresh.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
