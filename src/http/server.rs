//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application router with the gateway middleware stack
//!   (tracing, request ID, timeout, body limit, security headers,
//!   admission filter)
//! - Bind server to listener, with or without TLS
//! - Spawn the registry sweeper
//! - Apply configuration updates to the live admission settings
//! - Shut down gracefully on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admission::{admission_middleware, AdmissionState, Sweeper, WindowRegistry};
use crate::config::GatewayConfig;
use crate::http::request::MakeRequestUuid;
use crate::security::headers::security_headers_middleware;

/// HTTP server for the admission gateway.
///
/// Owns the window registry and the live admission settings; both are
/// created at construction and torn down when the server stops.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    admission: AdmissionState,
}

impl HttpServer {
    /// Create a new server wrapping `app` with the gateway middleware.
    ///
    /// `app` carries the application routes; the gateway neither knows
    /// nor cares what they serve.
    pub fn new(config: GatewayConfig, app: Router) -> Self {
        let admission = AdmissionState::new(&config.admission);
        let router = Self::build_router(&config, admission.clone(), app);
        Self {
            router,
            config,
            admission,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, admission: AdmissionState, app: Router) -> Router {
        // Admission sits closest to the app; security headers wrap it so
        // 429 rejections carry them too.
        let mut router = app.layer(middleware::from_fn_with_state(
            admission,
            admission_middleware,
        ));

        if config.security.enable_headers {
            router = router.layer(middleware::from_fn(security_headers_middleware));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                )))
                .layer(DefaultBodyLimit::max(config.security.max_body_size)),
        )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` delivers reloaded configurations whose admission
    /// section is swapped into the live settings. The broadcast receiver
    /// signals graceful shutdown for the server and its sweeper.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Spawn the registry sweeper.
        let sweeper = Sweeper::new(
            self.admission.registry.clone(),
            self.admission.settings.clone(),
        );
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        // Apply config updates to the live admission settings.
        let admission = self.admission.clone();
        let mut updates_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_config = config_updates.recv() => match maybe_config {
                        Some(new_config) => {
                            admission.apply(&new_config.admission);
                            tracing::info!(
                                window_ms = new_config.admission.window_ms,
                                max_requests = new_config.admission.max_requests,
                                path_prefix = %new_config.admission.path_prefix,
                                "Admission settings updated"
                            );
                        }
                        None => break,
                    },
                    _ = updates_shutdown.recv() => break,
                }
            }
        });

        match self.config.listener.tls.as_ref() {
            Some(tls) => {
                let rustls_config =
                    RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                    })
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Handle to the window registry (observability and tests).
    pub fn registry(&self) -> Arc<WindowRegistry> {
        self.admission.registry.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
