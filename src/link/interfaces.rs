//! Ethernet interface discovery.
//!
//! Produces the MAC -> interface-name map used to populate registration
//! choices. Loopback, virtual and WiFi interfaces, down interfaces and
//! null MACs are filtered out; the rest of the application treats the
//! result as opaque input.

use std::collections::BTreeMap;

use pnet_datalink as datalink;
use serde::Serialize;

/// Interface-name prefixes considered virtual.
const EXCLUDED_PREFIXES: &[&str] = &["vir", "docker", "br-", "veth", "vmnet", "vboxnet"];

/// Substrings marking WiFi interfaces.
const WIFI_KEYWORDS: &[&str] = &["wl", "wifi"];

/// Discovered interface details, for display.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub mac: String,
    pub up: bool,
}

/// All usable Ethernet interfaces as MAC address -> interface name.
pub fn available_interfaces() -> BTreeMap<String, String> {
    datalink::interfaces()
        .into_iter()
        .filter_map(|iface| {
            let mac = iface.mac.map(|m| m.octets());
            accept(&iface.name, iface.is_up(), iface.is_loopback(), mac)
                .map(|mac| (mac, iface.name))
        })
        .collect()
}

/// Interface name carrying the given MAC, if a usable one exists.
pub fn interface_by_mac(mac: &str) -> Option<String> {
    available_interfaces().remove(&mac.to_ascii_lowercase())
}

/// Whether a named interface exists and is up.
pub fn is_interface_up(name: &str) -> bool {
    datalink::interfaces()
        .iter()
        .any(|iface| iface.name == name && iface.is_up())
}

/// Detailed info for every usable interface.
pub fn all_interfaces_info() -> Vec<InterfaceInfo> {
    available_interfaces()
        .into_iter()
        .map(|(mac, name)| {
            let up = is_interface_up(&name);
            InterfaceInfo { name, mac, up }
        })
        .collect()
}

/// Filter rule: returns the canonical MAC string for interfaces that should
/// be offered to the operator.
fn accept(name: &str, is_up: bool, is_loopback: bool, mac: Option<[u8; 6]>) -> Option<String> {
    if is_loopback || name == "lo" {
        return None;
    }
    if EXCLUDED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return None;
    }
    let lower = name.to_ascii_lowercase();
    if WIFI_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return None;
    }
    if !is_up {
        return None;
    }

    let mac = mac?;
    if mac == [0u8; 6] {
        return None;
    }
    Some(crate::frame::format_mac(&mac))
}
