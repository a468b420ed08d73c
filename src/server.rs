//! HTTP server assembly and graceful shutdown.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::todos::{TodoService, todo_routes};

/// The full application router: todo routes plus tracing and request deadlines.
pub fn app(service: Arc<TodoService>, config: &ServerConfig) -> Router {
    with_layers(todo_routes(service), config)
}

/// Requests still running after `request_timeout` are answered with 408.
fn with_layers(router: Router, config: &ServerConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            )),
    )
}

/// Serve `app` until `shutdown` resolves.
///
/// After the signal no new connections are accepted and in-flight requests
/// get `grace` to finish. If they have not finished by then this returns
/// anyway; connection tasks still running are dropped with the runtime.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, mut signalled_rx) = watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown signal received, draining connections");
            let _ = signalled_tx.send(true);
        })
        .into_future();
    tokio::pin!(server);

    let grace_elapsed = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = &mut server => result,
        () = grace_elapsed => {
            warn!(?grace, "Grace period elapsed, closing remaining connections");
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Instant;

    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio::sync::{Notify, oneshot};
    use tower::ServiceExt;

    use super::*;

    fn config(request_timeout: Duration, shutdown_grace: Duration) -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            request_timeout,
            shutdown_grace,
        }
    }

    /// Router whose `/stall` handler signals `started` and never finishes.
    fn stalling_router(started: Arc<Notify>) -> Router {
        Router::new().route(
            "/stall",
            get(move || {
                let started = started.clone();
                async move {
                    started.notify_one();
                    std::future::pending::<()>().await
                }
            }),
        )
    }

    #[tokio::test]
    async fn slow_request_gets_408() {
        let cfg = config(Duration::from_millis(50), Duration::from_secs(1));
        let router = with_layers(stalling_router(Arc::new(Notify::new())), &cfg);

        let resp = tokio::time::timeout(
            Duration::from_secs(5),
            router.oneshot(Request::get("/stall").body(Body::empty()).unwrap()),
        )
        .await
        .expect("timeout layer did not fire")
        .unwrap();

        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn serve_returns_after_grace_with_request_in_flight() {
        let grace = Duration::from_millis(200);
        let cfg = config(Duration::from_secs(60), grace);
        let started = Arc::new(Notify::new());
        let router = with_layers(stalling_router(started.clone()), &cfg);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(
            listener,
            router,
            async move {
                let _ = rx.await;
            },
            grace,
        ));

        // Held open for the whole test so the request stays in flight.
        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /stall HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), started.notified())
            .await
            .expect("request never reached the handler");

        let signalled = Instant::now();
        tx.send(()).unwrap();
        tokio::time::timeout(grace + Duration::from_secs(2), server)
            .await
            .expect("serve did not return after the grace period")
            .unwrap()
            .unwrap();

        assert!(signalled.elapsed() >= grace);
        drop(client);
    }
}
