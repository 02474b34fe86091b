use std::net::Ipv4Addr;

use systemstat::{Platform, System};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub fn init_log() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Every IPv4 address a phone or laptop on the same network could reach us on.
///
/// Loopback, link-local, broadcast and unspecified addresses are left out. An
/// interface listing failure is logged and yields an empty list.
pub fn host_addresses() -> Vec<Ipv4Addr> {
    let networks = match System::new().networks() {
        Ok(networks) => networks,
        Err(e) => {
            warn!("Listing network interfaces failed: {}", e);
            return vec![];
        }
    };

    networks
        .values()
        .flat_map(|net| net.addrs.iter().map(move |n| (&net.name, n.addr.clone())))
        .filter_map(|(name, addr)| match addr {
            systemstat::IpAddr::V4(v) if is_shareable(v) => {
                debug!("iface: {} / {:?}", name, v);
                Some(v)
            }
            _ => None,
        })
        .collect()
}

/// The address reported by `/ip`, or `None` when the host has no
/// shareable IPv4 interface.
pub fn select_host_address() -> Option<Ipv4Addr> {
    host_addresses().into_iter().next()
}

/// Viewer page URLs logged at startup, one per [`host_addresses`] entry.
pub fn viewer_urls(port: u16) -> Vec<String> {
    host_addresses()
        .into_iter()
        .map(|ip| viewer_url(ip, port))
        .collect()
}

pub fn viewer_url(ip: Ipv4Addr, port: u16) -> String {
    format!("http://{ip}:{port}/view")
}

fn is_shareable(v: Ipv4Addr) -> bool {
    !v.is_loopback() && !v.is_link_local() && !v.is_broadcast() && !v.is_unspecified()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_url_points_at_view_page() {
        let url = viewer_url(Ipv4Addr::new(192, 168, 1, 20), 5000);
        assert_eq!(url, "http://192.168.1.20:5000/view");
    }

    #[test]
    fn loopback_and_link_local_are_not_shared() {
        assert!(!is_shareable(Ipv4Addr::LOCALHOST));
        assert!(!is_shareable(Ipv4Addr::new(169, 254, 3, 4)));
        assert!(!is_shareable(Ipv4Addr::BROADCAST));
        assert!(is_shareable(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn selected_address_is_shareable() {
        if let Some(ip) = select_host_address() {
            assert!(is_shareable(ip));
        }
    }

    #[test]
    fn banner_and_ip_endpoint_agree() {
        let addresses = host_addresses();
        assert_eq!(select_host_address(), addresses.first().copied());

        let urls = viewer_urls(5000);
        assert_eq!(urls.len(), addresses.len());
        for (url, ip) in urls.iter().zip(&addresses) {
            assert!(is_shareable(*ip));
            assert_eq!(*url, viewer_url(*ip, 5000));
        }
    }
}
