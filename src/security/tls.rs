use std::fs;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig as RustlsServerConfig;
use rustls_pemfile::{certs, read_one, Item};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use crate::config::{TlsConfig, TlsMode};

/// Build an [`axum_server`] TLS configuration from the configured PEM files.
pub fn build_rustls_config(tls: &TlsConfig) -> Result<RustlsConfig> {
    let server = Arc::new(build_server_config(tls)?);
    Ok(RustlsConfig::from_config(server))
}

/// Decide whether the listeners terminate TLS.
///
/// `auto` uses TLS when both files exist and load cleanly, and otherwise
/// falls back to plain TCP with a warning. `required` turns any problem into
/// an error. `disabled` never loads anything.
pub fn resolve_tls(tls: &TlsConfig) -> Result<Option<RustlsConfig>> {
    match tls.mode {
        TlsMode::Disabled => Ok(None),
        TlsMode::Required => build_rustls_config(tls)
            .map(Some)
            .context("security.tls.mode is `required` but TLS could not be initialized"),
        TlsMode::Auto => {
            if !tls.files_present() {
                tracing::warn!(
                    certificate_path = %tls.certificate_path,
                    private_key_path = %tls.private_key_path,
                    "TLS certificate or key not found, serving without encryption"
                );
                return Ok(None);
            }

            match build_rustls_config(tls) {
                Ok(config) => Ok(Some(config)),
                Err(err) => {
                    tracing::warn!(
                        error = %format!("{err:#}"),
                        "Failed to load TLS certificate, serving without encryption"
                    );
                    Ok(None)
                }
            }
        }
    }
}

fn build_server_config(tls: &TlsConfig) -> Result<RustlsServerConfig> {
    let cert_chain = load_cert_chain(&tls.certificate_path)?;
    let private_key = load_private_key(&tls.private_key_path)?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = RustlsServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|err| anyhow!("unsupported TLS protocol configuration: {err}"))?
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|err| anyhow!("invalid TLS certificate/private key pair: {err}"))?;

    // WebSocket upgrades and the static site are both served over HTTP/1.1.
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

fn load_cert_chain(cert_path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let data = fs::read(cert_path)
        .with_context(|| format!("failed to read TLS certificate chain at {cert_path}"))?;
    let mut reader = data.as_slice();
    let certs: Vec<CertificateDer<'static>> = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse TLS certificate chain at {cert_path}"))?;

    if certs.is_empty() {
        anyhow::bail!("no certificates were found in security.tls.certificate_path ({cert_path})");
    }

    Ok(certs)
}

fn load_private_key(key_path: &str) -> Result<PrivateKeyDer<'static>> {
    let key_bytes = fs::read(key_path)
        .with_context(|| format!("failed to read TLS private key at {key_path}"))?;

    let mut reader = key_bytes.as_slice();
    while let Some(item) = read_one(&mut reader)
        .with_context(|| format!("failed to parse PEM entry inside TLS private key ({key_path})"))?
    {
        let der: PrivateKeyDer<'static> = match item {
            Item::Pkcs8Key(key) => key.into(),
            Item::Pkcs1Key(key) => key.into(),
            Item::Sec1Key(key) => key.into(),
            _ => continue,
        };
        return Ok(der);
    }

    anyhow::bail!(
        "no supported private key (pkcs8/pkcs1/sec1) was found in security.tls.private_key_path ({key_path})"
    );
}
