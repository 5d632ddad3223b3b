// src/main.rs
use anyhow::{Context, Result};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use consulate::{
    aggregator::Aggregator,
    cache::{create_cache, CacheReaper, DEFAULT_REAP_INTERVAL},
    checks::CheckSet,
    config::{self, Config},
    metrics::MetricsRegistry,
    registry::RegistryClient,
    server::{RequestHandler, ServerBuilder},
    version::BuildInfo,
};

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = chrono::Utc::now();

    // Configuration comes first so it can decide the log level
    let config_path = std::env::args().nth(1);
    let config = config::load_config(config_path.as_deref()).await?;

    init_tracing(&config)?;

    let about = BuildInfo::new(started_at);
    info!("Starting {}", about.summary());
    match &config_path {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No configuration file given, using defaults and environment"),
    }

    // Initialize metrics
    let metrics_registry = MetricsRegistry::new()?;
    let metrics = metrics_registry.collector();

    // Registry client and check-set cache
    let client = RegistryClient::new(&config.client, Some(metrics.clone()))?;
    let cache = create_cache::<Arc<CheckSet>>(&config.cache);

    let reaper = if config.cache.duration_ms > 0 {
        let reaper = Arc::new(CacheReaper::new(cache.clone(), DEFAULT_REAP_INTERVAL));
        let task = tokio::spawn(reaper.clone().start());
        Some((reaper, task))
    } else {
        None
    };

    let threshold = config
        .checks
        .threshold()
        .context("Default threshold is not part of the configured severity scale")?;

    let aggregator = Arc::new(
        Aggregator::new(
            Arc::new(client),
            cache,
            config.status_codes,
            config.checks.severity_scale,
            threshold,
        )
        .with_metrics(metrics.clone()),
    );

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_addr: SocketAddr =
            (config.server.listen_address.ip(), config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone()).await?;
    }

    let registry_url = config.registry_url();
    info!("Verifying checks from {}", registry_url);

    let handler = RequestHandler::new(aggregator, registry_url, about).with_metrics(metrics);

    let result = ServerBuilder::new(config.server.listen_address)
        .with_handler(handler)
        .with_read_timeout(config.server.read_timeout())
        .with_write_timeout(config.server.write_timeout())
        .with_shutdown_timeout(config.server.shutdown_timeout())
        .serve_with_shutdown(shutdown_signal())
        .await;

    if let Some((reaper, task)) = reaper {
        reaper.shutdown();
        if let Err(e) = task.await {
            warn!("Cache reaper task failed: {}", e);
        }
    }

    match &result {
        Ok(()) => info!("Consulate server shutdown"),
        Err(e) => error!("Consulate server failed: {:#}", e),
    }
    result
}

fn init_tracing(config: &Config) -> Result<()> {
    let level = if config.logging.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("consulate={}", level).parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    Ok(())
}

async fn start_metrics_server(
    addr: SocketAddr,
    registry: MetricsRegistry,
    path: String,
) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    let response = if req.uri().path() == path.as_str() {
                        let mut response = Response::new(Body::from(registry.gather()));
                        response.headers_mut().insert(
                            CONTENT_TYPE,
                            HeaderValue::from_static("text/plain; version=0.0.4"),
                        );
                        response
                    } else {
                        let mut response = Response::new(Body::from("Not Found"));
                        *response.status_mut() = StatusCode::NOT_FOUND;
                        response
                    };
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    let server = Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind metrics listener on {}", addr))?
        .serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown trigger
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, shutting down Consulate server...");
}
