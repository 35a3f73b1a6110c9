//! hyper transport and graceful shutdown.
//!
//! The server is the only async part of the crate. For each request it:
//!
//! 1. collects the body into memory,
//! 2. moves the pipeline run onto tokio's blocking pool, since handlers are
//!    plain synchronous functions and may block,
//! 3. hands the buffered reply back to hyper.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server stops calling `accept()`, lets every
//! in-flight connection run to completion, then returns from
//! [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::context::LocalState;
use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::request::Request;

/// The HTTP server.
#[derive(Debug, Clone, Copy)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use stackable::Server;
    /// let server = Server::bind("127.0.0.1:3000").unwrap();
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr.parse().map_err(Error::other)?;
        Ok(Self { addr })
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self { addr: config.addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds, then serves `pipeline` until SIGTERM or Ctrl-C.
    pub async fn serve<S, L>(self, pipeline: Pipeline<S, L>) -> Result<(), Error>
    where
        S: Send + Sync + 'static,
        L: LocalState,
    {
        let listener = TcpListener::bind(self.addr).await?;
        serve_with_shutdown(listener, pipeline, shutdown_signal()).await
    }
}

/// Serves `pipeline` on an already bound `listener` until `shutdown`
/// resolves, then drains in-flight connections.
pub async fn serve_with_shutdown<S, L, F>(
    listener: TcpListener,
    pipeline: Pipeline<S, L>,
    shutdown: F,
) -> Result<(), Error>
where
    S: Send + Sync + 'static,
    L: LocalState,
    F: Future<Output = ()>,
{
    let pipeline = Arc::new(pipeline);

    info!(addr = %listener.local_addr()?, handlers = pipeline.len(), "stackable listening");

    // Every connection task, so shutdown can wait for them.
    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Shutdown first: a pending signal must win over queued connections.
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let pipeline = Arc::clone(&pipeline);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let pipeline = Arc::clone(&pipeline);
                        async move { dispatch(pipeline, req, remote_addr).await }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connections so the set does not grow unbounded.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("stackable stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the pipeline. Never fails towards hyper: transport
/// problems become `400`/`500` replies.
async fn dispatch<S, L>(
    pipeline: Arc<Pipeline<S, L>>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    S: Send + Sync + 'static,
    L: LocalState,
{
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(status_only(StatusCode::BAD_REQUEST));
        }
    };

    let request = Request::from_http(parts, body, remote_addr);

    match tokio::task::spawn_blocking(move || pipeline.serve_http(&request)).await {
        Ok(resp) => Ok(resp),
        Err(e) => {
            error!(peer = %remote_addr, "handler chain panicked: {e}");
            Ok(status_only(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn status_only(status: StatusCode) -> http::Response<Full<Bytes>> {
    let mut resp = http::Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM or SIGINT (Ctrl-C). Only Ctrl-C on non-Unix platforms.
///
/// If a handler cannot be installed that signal source is ignored, rather
/// than failing the server.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn from_config_uses_the_configured_addr() {
        let config = Config::from_toml_str("[server]\naddr = \"127.0.0.1:8123\"\n").unwrap();

        let server = Server::from_config(&config.server);

        assert_eq!(server.addr(), "127.0.0.1:8123".parse().unwrap());
    }

    #[test]
    fn default_config_listens_on_3000() {
        let server = Server::from_config(&ServerConfig::default());

        assert_eq!(server.addr().port(), 3000);
    }

    #[test]
    fn bind_rejects_malformed_addr() {
        assert!(Server::bind("localhost").is_err());
    }
}
