//! Free port allocation for the feed process.

use std::net::{Ipv4Addr, SocketAddr, TcpListener};

/// Ask the OS for an unused loopback TCP port.
///
/// The probe listener is dropped before returning, so the port is free for
/// the feed to bind. Must run before the gateway listener binds.
pub fn allocate_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    let port = listener.local_addr()?.port();
    drop(listener);

    tracing::debug!(port, "Allocated feed port");
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_port_is_bindable() {
        let port = allocate_port().unwrap();
        assert_ne!(port, 0);
        TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).unwrap();
    }
}
