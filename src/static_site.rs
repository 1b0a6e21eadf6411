//! HTTPS host for the browser client.
//!
//! Browsers only expose the microphone to secure origins, so on a LAN the
//! client page has to come over TLS even though the files are static.

use anyhow::{bail, Result};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::transport;

/// Router serving `root`, with `index.html` for directory requests.
pub fn create_static_router(root: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

/// True when `path` would be reachable through a file server rooted at `root`.
///
/// Paths that do not exist yet are resolved against their parent directory,
/// so a key that will only be generated at startup is still caught.
pub fn exposes(root: &Path, path: &Path) -> bool {
    resolve(path).starts_with(resolve(root))
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}

/// Run the static asset server until `shutdown` is cancelled.
///
/// Refuses to start when any of `private_paths` sits under `root`. Without
/// TLS the server is not started at all, since the page it would serve could
/// not use the microphone anyway.
pub async fn serve_static_files(
    addr: SocketAddr,
    root: PathBuf,
    private_paths: Vec<PathBuf>,
    tls: Option<RustlsConfig>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    if let Some(exposed) = private_paths.iter().find(|path| exposes(&root, path)) {
        bail!(
            "refusing to serve {}: it contains {}",
            root.display(),
            exposed.display()
        );
    }

    let Some(tls) = tls else {
        tracing::warn!(
            %addr,
            "Static file server needs a TLS certificate and was not started; \
             run with --generate-cert or set security.tls.generate_if_missing"
        );
        return Ok(());
    };

    if !root.is_dir() {
        tracing::warn!(
            root = %root.display(),
            "Static file root is not a directory; requests will return 404"
        );
    }

    transport::serve(
        "static",
        addr,
        create_static_router(root),
        Some(tls),
        shutdown,
        grace,
    )
    .await
}
