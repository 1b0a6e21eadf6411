//! HTTP listeners with optional TLS and cooperative shutdown.

use anyhow::{Context, Result};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Serve `router` on `addr` until `shutdown` is cancelled.
///
/// With a TLS config the listener terminates TLS via rustls; otherwise it
/// accepts plain TCP. In-flight HTTP requests get `grace` to finish.
/// Upgraded WebSocket connections are not covered here; they are tracked by
/// the relay itself.
pub async fn serve(
    name: &'static str,
    addr: SocketAddr,
    router: Router,
    tls: Option<RustlsConfig>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();

    match tls {
        Some(tls) => {
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(grace));
            });

            tracing::info!(listener = name, %addr, "Listening with TLS");
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(make_service)
                .await
                .with_context(|| format!("{name} listener on {addr} failed"))?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {name} listener on {addr}"))?;

            tracing::info!(listener = name, %addr, "Listening without TLS");
            axum::serve(listener, make_service)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .with_context(|| format!("{name} listener on {addr} failed"))?;
        }
    }

    tracing::info!(listener = name, "Listener stopped");
    Ok(())
}
