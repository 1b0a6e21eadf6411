//! Configuration validation functions.

use super::security::TlsMode;
use super::Config;
use std::net::IpAddr;
use std::path::Path;

/// Reject configurations the relay cannot start with.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.bind_address.trim().parse::<IpAddr>().is_err() {
        anyhow::bail!(
            "bind_address must be an IP address (configured: {:?})",
            config.bind_address
        );
    }

    if config.static_files.enabled && config.static_files.port == config.port {
        anyhow::bail!(
            "static_files.port and port must differ (both are {})",
            config.port
        );
    }

    if config.server.max_message_size == 0 {
        anyhow::bail!("server.max_message_size must be greater than zero");
    }

    if config.server.outbound_queue_capacity == 0 {
        anyhow::bail!("server.outbound_queue_capacity must be greater than zero");
    }

    let tls = &config.security.tls;
    if tls.mode == TlsMode::Required && !tls.generate_if_missing {
        if !Path::new(&tls.certificate_path).is_file() {
            anyhow::bail!(
                "TLS is required but the certificate file was not found at {}",
                tls.certificate_path
            );
        }
        if !Path::new(&tls.private_key_path).is_file() {
            anyhow::bail!(
                "TLS is required but the private key file was not found at {}",
                tls.private_key_path
            );
        }
    }

    if config.static_files.enabled
        && crate::static_site::exposes(
            Path::new(&config.static_files.root),
            Path::new(&tls.private_key_path),
        )
    {
        anyhow::bail!(
            "security.tls.private_key_path ({}) must not be inside static_files.root ({})",
            tls.private_key_path,
            config.static_files.root
        );
    }

    if tls.certificate_validity_days == 0 {
        anyhow::bail!("security.tls.certificate_validity_days must be greater than zero");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_colliding_ports() {
        let mut config = Config::default();
        config.static_files.port = config.port;
        assert!(validate_config(&config).is_err());

        config.static_files.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_bad_bind_address() {
        let config = Config {
            bind_address: "everywhere".to_string(),
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        let mut config = Config::default();
        config.server.max_message_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.server.outbound_queue_capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn required_tls_needs_files_unless_generated() {
        let mut config = Config::default();
        config.security.tls.mode = TlsMode::Required;
        config.security.tls.certificate_path = "/nonexistent/server.crt".to_string();
        config.security.tls.private_key_path = "/nonexistent/server.key".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("certificate file was not found"));

        config.security.tls.generate_if_missing = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_private_key_inside_static_root() {
        let mut config = Config::default();
        config.static_files.root = ".".to_string();
        config.security.tls.private_key_path = "server.key".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must not be inside"), "{err}");

        config.static_files.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn auto_tls_tolerates_missing_files() {
        let mut config = Config::default();
        config.security.tls.certificate_path = "/nonexistent/server.crt".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
