/// Transport security for the relay and the static asset server
///
/// This module provides:
/// - TLS server configuration from PEM files (rustls)
/// - Self-signed certificate generation for LAN hosts (rcgen)
pub mod certificate;
pub mod tls;

pub use certificate::{
    ensure_certificate, generate_self_signed, write_pem_files, CertificateError,
    GeneratedCertificate,
};
pub use tls::{build_rustls_config, resolve_tls};
