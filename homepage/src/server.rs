//! TCP front end: accepts HTTP/1 connections and feeds requests to a
//! [`Service`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::app::Service;
use crate::middleware::BodyRejection;
use crate::response::BoxBody;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<F>(service: Arc<Service>, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(addr).await?;
    serve_listener(service, listener, shutdown).await
}

/// Serves on an already bound listener until `shutdown` resolves, then
/// waits up to ten seconds for open connections to finish.
pub async fn serve_listener<F>(
    service: Arc<Service>,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    info!(addr = %listener.local_addr()?, "listening");

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let service = service.clone();
                let svc = service_fn(move |req: Request<Incoming>| {
                    let service = service.clone();
                    async move { Ok::<_, Infallible>(handle(&service, req).await) }
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn);

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        }
    }

    drop(listener);

    if tokio::time::timeout(SHUTDOWN_GRACE, graceful.shutdown())
        .await
        .is_err()
    {
        warn!("connections still open after grace period");
    }

    Ok(())
}

/// Resolves once `signal` fires.
///
/// If the signal handler cannot be installed the error is logged and the
/// returned future never resolves, so the server keeps running instead of
/// stopping right after it starts.
pub async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!(error = %e, "failed to install shutdown signal handler");
        std::future::pending::<()>().await;
    }
}

async fn handle(service: &Service, req: Request<Incoming>) -> Response<BoxBody> {
    let req = read_body(req, service.config().body_limit).await;
    service.dispatch(req).await
}

/// Collects the body, up to `limit` bytes.
///
/// When collection fails the request keeps its head, gets an empty body
/// and a [`BodyRejection`] marker, and is still dispatched so the usual
/// middlewares see it.
async fn read_body(req: Request<Incoming>, limit: usize) -> Request<Bytes> {
    let (mut parts, body) = req.into_parts();

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Request::from_parts(parts, collected.to_bytes()),
        Err(e) => {
            let rejection = if e.is::<LengthLimitError>() {
                BodyRejection::TooLarge
            } else {
                BodyRejection::Unreadable
            };
            debug!(?rejection, error = %e, "request body rejected");
            parts.extensions.insert(rejection);
            Request::from_parts(parts, Bytes::new())
        }
    }
}
