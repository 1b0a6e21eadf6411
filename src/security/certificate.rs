use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Utc};
use rcgen::{date_time_ymd, CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber};
use thiserror::Error;

use crate::config::TlsConfig;

/// Serial number stamped on every generated certificate.
const SERIAL_NUMBER: u64 = 1000;

/// Errors from generating or persisting a self-signed certificate.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate validity must be at least one day")]
    InvalidValidity,

    #[error("certificate generation failed: {0}")]
    Generation(#[from] rcgen::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// PEM-encoded certificate and private key.
#[derive(Debug, Clone)]
pub struct GeneratedCertificate {
    pub certificate_pem: String,
    pub private_key_pem: String,
}

/// Generate a self-signed certificate for `common_name`.
///
/// The certificate is valid from today for `validity_days` and lists the
/// common name, `localhost` and `127.0.0.1` as subject alternative names so
/// the same pair works for LAN and loopback access.
pub fn generate_self_signed(
    common_name: &str,
    validity_days: u32,
) -> Result<GeneratedCertificate, CertificateError> {
    if validity_days == 0 {
        return Err(CertificateError::InvalidValidity);
    }

    let mut subject_alt_names = vec![common_name.to_string()];
    for extra in ["localhost", "127.0.0.1"] {
        if !subject_alt_names.iter().any(|name| name == extra) {
            subject_alt_names.push(extra.to_string());
        }
    }

    let mut params = CertificateParams::new(subject_alt_names)?;

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CountryName, "US");
    distinguished_name.push(DnType::StateOrProvinceName, "Development");
    distinguished_name.push(DnType::LocalityName, "Local");
    distinguished_name.push(DnType::OrganizationName, "LAN Voice Call");
    distinguished_name.push(DnType::OrganizationalUnitName, "Development");
    distinguished_name.push(DnType::CommonName, common_name);
    params.distinguished_name = distinguished_name;

    let today = Utc::now().date_naive();
    let expires = today
        .checked_add_days(Days::new(u64::from(validity_days)))
        .ok_or(CertificateError::InvalidValidity)?;
    // chrono months and days always fit in a u8.
    params.not_before = date_time_ymd(today.year(), today.month() as u8, today.day() as u8);
    params.not_after = date_time_ymd(expires.year(), expires.month() as u8, expires.day() as u8);
    params.serial_number = Some(SerialNumber::from(SERIAL_NUMBER));

    let key_pair = KeyPair::generate()?;
    let certificate = params.self_signed(&key_pair)?;

    Ok(GeneratedCertificate {
        certificate_pem: certificate.pem(),
        private_key_pem: key_pair.serialize_pem(),
    })
}

/// Write both PEM files, creating parent directories as needed.
pub fn write_pem_files(
    generated: &GeneratedCertificate,
    certificate_path: &Path,
    private_key_path: &Path,
) -> Result<(), CertificateError> {
    write_file(certificate_path, &generated.certificate_pem)?;
    write_file(private_key_path, &generated.private_key_pem)?;
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CertificateError> {
    let to_error = |source: io::Error| CertificateError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, contents).map_err(to_error)
}

/// Generate the configured certificate pair when it is missing and
/// `generate_if_missing` is set.
///
/// Returns `true` if new files were written.
pub fn ensure_certificate(tls: &TlsConfig, common_name: &str) -> Result<bool, CertificateError> {
    if tls.files_present() || !tls.generate_if_missing {
        return Ok(false);
    }

    let generated = generate_self_signed(common_name, tls.certificate_validity_days)?;
    write_pem_files(
        &generated,
        Path::new(&tls.certificate_path),
        Path::new(&tls.private_key_path),
    )?;
    tracing::info!(
        certificate_path = %tls.certificate_path,
        private_key_path = %tls.private_key_path,
        %common_name,
        validity_days = tls.certificate_validity_days,
        "Generated self-signed TLS certificate"
    );
    Ok(true)
}
