//! Redirect resolver service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http server ──▶ routing::Resolver          │
//!                           │                      │                        │
//!                           │         ┌────────────┼──────────────┐         │
//!                           │         ▼            ▼              ▼         │
//!                           │      redirect     forward       no rule       │
//!                           │     (301/302)        │              │         │
//!     Client Response       │         │            ▼              ▼         │
//!     ◀─────────────────────┼─────────┘       upstream ◀──── upstream/404 ──┼──── Upstream
//!                           │                                               │
//!                           │   rules::Catalog ◀── config watcher (reload)  │
//!                           │   observability: tracing + Prometheus         │
//!                           └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use tokio::net::TcpListener;

use redirect_resolver::config::load_config;
use redirect_resolver::http::HttpServer;
use redirect_resolver::lifecycle::{run_config_reload, signals, Services, Shutdown};
use redirect_resolver::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("redirects.toml"));

    let config = load_config(&config_path)?;
    logging::init_logging(&config.observability);

    tracing::info!("redirect-resolver v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_path.display(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rules = config.rules.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = Services::from_config(&config);
    let shutdown = Shutdown::new();

    let reload_services = services.clone();
    let reload_shutdown = shutdown.subscribe();
    let reload_path = config_path.clone();
    tokio::spawn(async move {
        if let Err(e) = run_config_reload(&reload_path, reload_services, reload_shutdown).await {
            tracing::error!(error = %e, "Config watcher failed, hot reload disabled");
        }
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, services.resolver.clone());
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
