//! Typed records for `ip -json addr` and `ip -json route` output
//!
//! Only the fields the queries need are modelled; everything else in the
//! payload is ignored.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Flag `ip` sets on links with no cable/peer detected
pub const NO_CARRIER: &str = "NO-CARRIER";

/// One address of an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// `inet` or `inet6`
    pub family: String,
    pub local: String,
}

/// One interface from `ip -json addr`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    #[serde(rename = "ifindex")]
    pub interface_index: u32,

    #[serde(rename = "ifname")]
    pub interface_name: String,

    #[serde(default)]
    pub flags: BTreeSet<String>,

    /// Bridge or bond this interface is enslaved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,

    #[serde(rename = "addr_info", default)]
    pub addresses: Vec<AddressInfo>,
}

impl AddressEntry {
    /// First IPv4 address, if any
    pub fn ipv4(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|addr| addr.family == "inet")
            .map(|addr| addr.local.as_str())
    }

    pub fn has_carrier(&self) -> bool {
        !self.flags.contains(NO_CARRIER)
    }

    /// Link is up at layer 1 but nothing is configured on it
    pub fn needs_configuration(&self) -> bool {
        self.addresses.is_empty() && self.has_carrier()
    }
}

/// One route from `ip -json route`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Prefix or `default`
    #[serde(rename = "dst")]
    pub destination: String,

    /// Missing on multipath and blackhole routes
    #[serde(rename = "dev", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

pub fn parse_addresses(payload: &str) -> Result<Vec<AddressEntry>, serde_json::Error> {
    serde_json::from_str(payload)
}

pub fn parse_routes(payload: &str) -> Result<Vec<RouteEntry>, serde_json::Error> {
    serde_json::from_str(payload)
}

/// Interface called `name`
pub fn find_entry<'a>(entries: &'a [AddressEntry], name: &str) -> Option<&'a AddressEntry> {
    entries.iter().find(|entry| entry.interface_name == name)
}

/// Device of the first route to `destination` that names one
pub fn route_device<'a>(routes: &'a [RouteEntry], destination: &str) -> Option<&'a str> {
    routes
        .iter()
        .filter(|route| route.destination == destination)
        .find_map(|route| route.device.as_deref())
}
