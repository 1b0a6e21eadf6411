#![cfg_attr(not(test), deny(clippy::panic))]

use anyhow::Context;
use clap::Parser;
use lan_call_signaling::config::{self, Config};
use lan_call_signaling::server::SignalingServer;
use lan_call_signaling::{logging, network, security, static_site, transport, websocket};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// LAN Call Signaling -- WebSocket signaling relay for browser voice calls on a local network
#[derive(Parser, Debug)]
#[command(name = "lan-call-signaling")]
#[command(about = "A minimal WebSocket signaling relay for WebRTC voice calls on a local network")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with_all = ["print_config", "generate_cert"])]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with_all = ["validate_config", "generate_cert"])]
    print_config: bool,

    /// Write a fresh self-signed certificate and key to the configured paths and exit.
    #[arg(long, conflicts_with_all = ["validate_config", "print_config"])]
    generate_cert: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // config::load() only reports validation problems on stderr; capture the
    // result here so --validate-config and normal startup can act on it.
    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Signaling: {}:{}", cfg.bind_address, cfg.port);
                println!("  TLS mode: {:?}", cfg.security.tls.mode);
                println!(
                    "  Static files: {} (port {}, root {})",
                    if cfg.static_files.enabled {
                        "enabled"
                    } else {
                        "disabled"
                    },
                    cfg.static_files.port,
                    cfg.static_files.root
                );
                println!("  Max message size: {} bytes", cfg.server.max_message_size);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    if cli.generate_cert {
        return generate_certificate(&cfg);
    }

    validation_result?;

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = logging::init_with_config(&cfg.logging);

    run(cfg).await
}

fn generate_certificate(cfg: &Config) -> anyhow::Result<()> {
    let tls = &cfg.security.tls;
    let common_name = network::local_network_address().to_string();
    let generated = security::generate_self_signed(&common_name, tls.certificate_validity_days)
        .context("failed to generate self-signed certificate")?;
    security::write_pem_files(
        &generated,
        Path::new(&tls.certificate_path),
        Path::new(&tls.private_key_path),
    )
    .context("failed to write certificate files")?;

    println!("Generated self-signed certificate for {common_name}");
    println!("  Certificate: {}", tls.certificate_path);
    println!("  Private key: {}", tls.private_key_path);
    println!("  Valid for {} days", tls.certificate_validity_days);
    Ok(())
}

async fn run(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bind_ip: IpAddr = cfg
        .bind_address
        .trim()
        .parse()
        .with_context(|| format!("invalid bind_address `{}`", cfg.bind_address))?;
    let lan_address = network::local_network_address();

    security::ensure_certificate(&cfg.security.tls, &lan_address.to_string())
        .context("failed to prepare TLS certificate")?;
    let tls = security::resolve_tls(&cfg.security.tls)?;

    let shutdown = CancellationToken::new();
    let grace = Duration::from_secs(cfg.server.shutdown_grace_period_secs);
    let server = SignalingServer::with_shutdown_token(cfg.server.clone(), shutdown.clone());
    let router = websocket::create_router(&cfg.security.cors_origins).with_state(server.clone());

    let scheme = if tls.is_some() { "wss" } else { "ws" };
    for url in network::advertised_urls(scheme, lan_address, cfg.port) {
        tracing::info!(%url, "Signaling relay reachable");
    }

    let relay_addr = SocketAddr::new(bind_ip, cfg.port);
    let relay = tokio::spawn(transport::serve(
        "signaling",
        relay_addr,
        router,
        tls.clone(),
        shutdown.clone(),
        grace,
    ));

    let static_task = if cfg.static_files.enabled {
        if tls.is_some() {
            for url in network::advertised_urls("https", lan_address, cfg.static_files.port) {
                tracing::info!(%url, "Client application reachable");
            }
        }
        let static_addr = SocketAddr::new(bind_ip, cfg.static_files.port);
        Some(tokio::spawn(static_site::serve_static_files(
            static_addr,
            PathBuf::from(&cfg.static_files.root),
            vec![PathBuf::from(&cfg.security.tls.private_key_path)],
            tls,
            shutdown.clone(),
            grace,
        )))
    } else {
        None
    };

    let signal_server = server.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = ?err, "failed to install ctrl-c handler");
            return;
        }
        tracing::info!("Shutdown signal received");
        signal_server.begin_shutdown();
    });

    let relay_result = relay.await.context("signaling listener task failed")?;

    // Also reached when the listener fails on its own; stop everything else.
    server.begin_shutdown();
    server.wait_for_connections(grace).await;

    if let Some(task) = static_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(error = ?err, "Static file server failed"),
            Err(err) => tracing::error!(error = %err, "Static file server task failed"),
        }
    }

    relay_result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
