// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::bind_tcp;
use anyhow::{bail, Context, Result};
use hyper::server::conn::{AddrIncoming, AddrStream};
use hyper::service::make_service_fn;
use hyper::{Body, Request, Response, Server};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::{Service, ServiceBuilder};

/// Builder so `main.rs` can inject its request handler and timeouts.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
    read_timeout: Duration,
    write_timeout: Duration,
    shutdown_timeout: Duration,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            handler: None,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Maximum time to receive request headers.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Maximum time the handler may take to produce a response.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// How long in-flight requests may drain after `shutdown` resolves.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = bind_tcp(self.addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves, then
    /// drain in-flight requests for at most the shutdown timeout.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let handler = self
            .handler
            .context("handler must be set via with_handler()")?;

        let local_addr = listener.local_addr()?;
        let incoming = AddrIncoming::from_listener(listener)?;

        let service = ServiceBuilder::new()
            .timeout(self.write_timeout)
            .service(handler);

        let make_service = make_service_fn(move |_conn: &AddrStream| {
            let svc = service.clone();
            async move { Ok::<_, Infallible>(svc) }
        });

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = Server::builder(incoming)
            .http1_header_read_timeout(self.read_timeout)
            .serve(make_service)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            });
        tokio::pin!(server);

        tracing::info!("HTTP server listening on {}", local_addr);

        tokio::select! {
            result = &mut server => {
                result?;
                return Ok(());
            }
            _ = shutdown => {}
        }

        tracing::info!(
            "Draining in-flight requests for up to {:?}",
            self.shutdown_timeout
        );
        let _ = stop_tx.send(());

        match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
            Ok(result) => {
                result?;
                tracing::info!("HTTP server shut down");
                Ok(())
            }
            Err(_) => bail!(
                "HTTP server shutdown timed out after {:?}",
                self.shutdown_timeout
            ),
        }
    }
}
