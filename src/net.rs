use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Best guess at the address other devices on the LAN can reach us on.
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outbound interface, whose address we then read back.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    socket
        .local_addr()
        .ok()
        .map(|addr| addr.ip())
        .filter(|ip| !ip.is_unspecified())
}

/// Host to print in the startup banner for a given bind address.
pub fn advertised_host(bind: IpAddr) -> IpAddr {
    if bind.is_unspecified() {
        local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    } else {
        bind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_specific_bind_is_advertised_as_is() {
        let bind: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(advertised_host(bind), bind);
    }

    #[test]
    fn test_unspecified_bind_resolves_to_concrete_address() {
        let host = advertised_host(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(!host.is_unspecified());
    }
}
