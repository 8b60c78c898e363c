use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use nestoi_core::NestoiError;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bind `addr` and serve `router` until Ctrl-C (or SIGTERM on Unix).
pub async fn serve(router: Router, addr: &str) -> Result<(), NestoiError> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, router, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes.
///
/// Handlers and middlewares can read the client address through
/// `ConnectInfo<SocketAddr>`.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), NestoiError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "nestoi server listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    info!("nestoi server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
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

    info!("shutdown signal received, draining connections");
}
