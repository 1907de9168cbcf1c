//! Instance identity: advertised address and instance ID.

use nix::ifaddrs::getifaddrs;
use nix::unistd::gethostname;
use std::net::Ipv4Addr;

/// IPv4 addresses of all local interfaces, in enumeration order.
pub fn interface_ipv4_addresses() -> Vec<Ipv4Addr> {
    match getifaddrs() {
        Ok(addrs) => addrs
            .filter_map(|ifaddr| {
                ifaddr
                    .address
                    .and_then(|addr| addr.as_sockaddr_in().map(|sin| Ipv4Addr::from(sin.ip())))
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Unable to enumerate network interfaces");
            Vec::new()
        }
    }
}

/// First address that is neither loopback nor unspecified.
pub fn first_non_loopback_ipv4<I>(addrs: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = Ipv4Addr>,
{
    addrs
        .into_iter()
        .find(|ip| !ip.is_loopback() && !ip.is_unspecified())
}

/// The host's own name.
pub fn hostname() -> Result<String, String> {
    let name = gethostname().map_err(|e| e.to_string())?;
    name.into_string()
        .map_err(|_| "hostname is not valid UTF-8".to_string())
}

/// Address announced to discovery.
///
/// An explicit override wins; otherwise the first non-loopback IPv4
/// interface address, otherwise the host name.
pub fn advertised_address(override_address: Option<&str>) -> Result<String, String> {
    if let Some(address) = override_address {
        return Ok(address.to_string());
    }
    match first_non_loopback_ipv4(interface_ipv4_addresses()) {
        Some(ip) => Ok(ip.to_string()),
        None => hostname(),
    }
}

/// `{service}-{port}-{16 hex chars}`, random per call.
pub fn instance_id(service_name: &str, port: u16) -> String {
    let suffix: [u8; 8] = rand::random();
    format!("{}-{}-{}", service_name, port, hex::encode(suffix))
}
