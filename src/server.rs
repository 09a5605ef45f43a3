//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()` — no new connections are made.
//! 2. Telling every open connection to finish its current request and close.
//!    Idle keep-alive connections close at once; in-flight requests run to
//!    completion, so every access-log pair started gets its end record.
//! 3. Dropping the endpoint, which closes its log file, and returning from
//!    [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::handler::Endpoint;
use crate::request::Request;
use crate::writer::ResponseBuffer;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use waymark::Server;
    /// let server = Server::bind("0.0.0.0:3000")?;
    /// # Ok::<(), waymark::Error>(())
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()? })
    }

    /// Serves `endpoint` until SIGTERM or Ctrl-C, then drains in-flight
    /// requests.
    pub async fn serve(self, endpoint: impl Endpoint) -> Result<(), Error> {
        self.serve_with_shutdown(endpoint, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of waiting for a process signal.
    pub async fn serve_with_shutdown<E, S>(self, endpoint: E, signal: S) -> Result<(), Error>
    where
        E: Endpoint,
        S: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        let endpoint = Arc::new(endpoint);

        info!(addr = %self.addr, "waymark listening");

        // HTTP/1.1 or HTTP/2, whichever the client speaks.
        let builder = ConnBuilder::new(TokioExecutor::new());
        // Every open connection, so shutdown can ask each to wind down.
        let graceful = GracefulShutdown::new();
        // Every spawned connection task, so shutdown can wait for them.
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even with connections still queued.
                biased;

                () = &mut signal => {
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

                    let endpoint = Arc::clone(&endpoint);
                    let io = TokioIo::new(stream);

                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let endpoint = Arc::clone(&endpoint);
                        async move { dispatch(endpoint, req, remote_addr).await }
                    });

                    let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());
                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet does not grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Idle keep-alive connections would otherwise hold the drain open
        // forever; this closes them and lets busy ones finish their request.
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("waymark stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads one request body, runs the endpoint against a fresh
/// [`ResponseBuffer`], and hands the result to hyper.
///
/// Failures become HTTP responses, so hyper never sees an error.
async fn dispatch<E: Endpoint>(
    endpoint: Arc<E>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "request body read failed: {e}");
            let mut res = http::Response::new(Full::new(Bytes::new()));
            *res.status_mut() = http::StatusCode::BAD_REQUEST;
            return Ok(res);
        }
    };

    let mut buffer = ResponseBuffer::new();
    endpoint.serve(Request::from_parts(parts, body, remote_addr), &mut buffer).await;
    Ok(buffer.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM (Kubernetes) or SIGINT (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
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
