//! Network state introspection
//!
//! Every query runs `ip -json addr` or `ip -json route` on the host again;
//! nothing is cached, so callers can poll while links come up.

mod entries;
mod error;

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use tracing::Level;

use crate::host::Host;

pub use entries::{
    AddressEntry, AddressInfo, NO_CARRIER, RouteEntry, find_entry, parse_addresses, parse_routes,
    route_device,
};
pub use error::NetError;

const LIST_ADDRESSES: &str = "ip -json a";
const LIST_ROUTES: &str = "ip -json r";

/// All interfaces with their addresses
pub fn list_addresses<H: Host + ?Sized>(host: &mut H) -> Result<Vec<AddressEntry>, NetError> {
    let output = host
        .run_logged(LIST_ADDRESSES, Level::DEBUG)?
        .ok_or_failed(LIST_ADDRESSES)?;
    Ok(parse_addresses(output.stdout())?)
}

/// The routing table
pub fn list_routes<H: Host + ?Sized>(host: &mut H) -> Result<Vec<RouteEntry>, NetError> {
    let output = host
        .run_logged(LIST_ROUTES, Level::DEBUG)?
        .ok_or_failed(LIST_ROUTES)?;
    Ok(parse_routes(output.stdout())?)
}

/// Interface named `port_name`
pub fn find_port<H: Host + ?Sized>(
    host: &mut H,
    port_name: &str,
) -> Result<Option<AddressEntry>, NetError> {
    let entries = list_addresses(host)?;
    Ok(find_entry(&entries, port_name).cloned())
}

/// First IPv4 address of `port_name`
pub fn port_to_ip<H: Host + ?Sized>(
    host: &mut H,
    port_name: &str,
) -> Result<Option<String>, NetError> {
    Ok(find_port(host, port_name)?.and_then(|entry| entry.ipv4().map(str::to_string)))
}

/// Device that owns the route to `destination` (e.g. `default`)
pub fn route_to_port<H: Host + ?Sized>(
    host: &mut H,
    destination: &str,
) -> Result<Option<String>, NetError> {
    let routes = list_routes(host)?;
    Ok(route_device(&routes, destination).map(str::to_string))
}

/// Interfaces with carrier but no addresses
pub fn carrier_no_addr<H: Host + ?Sized>(host: &mut H) -> Result<Vec<AddressEntry>, NetError> {
    Ok(list_addresses(host)?
        .into_iter()
        .filter(AddressEntry::needs_configuration)
        .collect())
}

pub fn interface_names<H: Host + ?Sized>(host: &mut H) -> Result<Vec<String>, NetError> {
    Ok(list_addresses(host)?
        .into_iter()
        .map(|entry| entry.interface_name)
        .collect())
}

/// False when the port is missing or reports `NO-CARRIER`
pub fn port_has_carrier<H: Host + ?Sized>(host: &mut H, port_name: &str) -> Result<bool, NetError> {
    Ok(find_port(host, port_name)?.is_some_and(|entry| entry.has_carrier()))
}

/// Interface names from an `ip -json addr` payload already in hand
pub fn extract_interfaces(payload: &str) -> Result<Vec<String>, NetError> {
    Ok(parse_addresses(payload)?
        .into_iter()
        .map(|entry| entry.interface_name)
        .collect())
}

/// Whether `addr` lies in `subnet`
///
/// `subnet` is CIDR; host bits are ignored, and a bare address is treated
/// as a single-host network. Mixed IPv4/IPv6 never matches.
pub fn ip_in_subnet(addr: &str, subnet: &str) -> Result<bool, NetError> {
    let addr = IpAddr::from_str(addr.trim())
        .map_err(|_| NetError::InvalidAddress(addr.to_string()))?;
    let network = parse_subnet(subnet)?;
    Ok(network.contains(&addr))
}

fn parse_subnet(subnet: &str) -> Result<IpNet, NetError> {
    let subnet = subnet.trim();
    if let Ok(network) = IpNet::from_str(subnet) {
        return Ok(network.trunc());
    }
    IpAddr::from_str(subnet)
        .map(IpNet::from)
        .map_err(|_| NetError::InvalidSubnet(subnet.to_string()))
}
