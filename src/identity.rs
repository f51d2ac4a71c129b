//! Identity of the forwarding node, attached to every submitted event.

use crate::mac_address::MacAddress;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::Path;

/// Any routable address works; connecting a UDP socket sends no packets.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Where Linux exposes one directory per network interface.
const SYSFS_NET_DIR: &str = "/sys/class/net";

/// Addresses the collector uses to tell reporting nodes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub ip_address: IpAddr,
    pub hardware_address: MacAddress,
}

impl DeviceIdentity {
    /// Sentinel reported when the outbound address cannot be determined.
    pub const UNKNOWN_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

    pub fn new(ip_address: IpAddr, hardware_address: MacAddress) -> Self {
        Self {
            ip_address,
            hardware_address,
        }
    }

    /// Discover the node's identity, preferring explicit overrides.
    ///
    /// Discovery never fails: the IP falls back to `0.0.0.0` and the hardware
    /// address to all zeroes.
    pub fn discover(ip_override: Option<IpAddr>, mac_override: Option<MacAddress>) -> Self {
        let ip_address = ip_override.unwrap_or_else(|| {
            outbound_ip().unwrap_or_else(|err| {
                tracing::warn!("Could not determine outbound IP address: {}", err);
                Self::UNKNOWN_IP
            })
        });

        let hardware_address = mac_override.unwrap_or_else(|| {
            hardware_address(Path::new(SYSFS_NET_DIR)).unwrap_or_else(|| {
                tracing::warn!("No hardware address found under {}", SYSFS_NET_DIR);
                MacAddress::default()
            })
        });

        Self::new(ip_address, hardware_address)
    }
}

/// Local address of the interface the default route goes through.
fn outbound_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

/// First usable hardware address among the interfaces under `net_dir`.
///
/// Interfaces are visited in name order so the result is stable across runs.
/// Loopback and all-zero addresses are skipped.
fn hardware_address(net_dir: &Path) -> Option<MacAddress> {
    let mut interfaces: Vec<_> = fs::read_dir(net_dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name() != "lo")
        .map(|entry| entry.path())
        .collect();
    interfaces.sort();

    interfaces.iter().find_map(|iface| {
        let raw = fs::read_to_string(iface.join("address")).ok()?;
        raw.parse::<MacAddress>()
            .ok()
            .filter(|mac| !mac.is_nil())
    })
}
