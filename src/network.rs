//! Best-guess LAN address of this host.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Public address used only to pick an outbound interface; nothing is sent.
const ROUTE_PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// The address other hosts on the LAN most likely reach this machine at.
///
/// "Connecting" a UDP socket only selects a route, so this works offline as
/// long as a default route exists. Falls back to `127.0.0.1`.
pub fn local_network_address() -> IpAddr {
    match detect_route_address() {
        Ok(addr) if !addr.is_unspecified() => addr,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(err) => {
            tracing::debug!(error = %err, "Could not determine LAN address, using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn detect_route_address() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

/// URLs a user can open or point a client at, LAN address first.
pub fn advertised_urls(scheme: &str, lan_address: IpAddr, port: u16) -> Vec<String> {
    let mut urls = vec![format!("{scheme}://{lan_address}:{port}")];
    if !lan_address.is_loopback() {
        urls.push(format!("{scheme}://localhost:{port}"));
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_address_is_never_unspecified() {
        assert!(!local_network_address().is_unspecified());
    }

    #[test]
    fn advertised_urls_include_localhost_for_lan_addresses() {
        let lan: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(
            advertised_urls("wss", lan, 8765),
            vec!["wss://192.168.1.20:8765", "wss://localhost:8765"]
        );
    }

    #[test]
    fn loopback_is_advertised_once() {
        let urls = advertised_urls("ws", IpAddr::V4(Ipv4Addr::LOCALHOST), 8765);
        assert_eq!(urls, vec!["ws://127.0.0.1:8765"]);
    }
}
