//! BMC address and credentials
//!
//! When a node has no explicit BMC address, the lab convention is that the
//! BMC sits one address above the node's primary IPv4 address.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use super::error::BmcError;

/// Where and how to reach a node's management controller
#[derive(Clone, PartialEq, Eq)]
pub struct BmcDescriptor {
    pub address: String,
    pub username: String,
    pub password: String,
}

// Password stays out of logs
impl fmt::Debug for BmcDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BmcDescriptor")
            .field("address", &self.address)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BmcDescriptor {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Use `explicit` if given, otherwise derive from `hostname`
    pub fn resolve(
        hostname: &str,
        explicit: Option<&str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, BmcError> {
        let address = match explicit {
            Some(address) => address.to_string(),
            None => {
                let derived = derive_bmc_address(hostname)?;
                tracing::debug!("derived BMC address {} for {}", derived, hostname);
                derived.to_string()
            }
        };
        Ok(Self::new(address, username, password))
    }
}

/// Resolve `hostname` and add one to the last octet of its first IPv4 address
pub fn derive_bmc_address(hostname: &str) -> Result<Ipv4Addr, BmcError> {
    let resolve_error = |reason: String| BmcError::Resolve {
        hostname: hostname.to_string(),
        reason,
    };
    let ipv4 = (hostname, 0)
        .to_socket_addrs()
        .map_err(|e| resolve_error(e.to_string()))?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| resolve_error("no IPv4 address".to_string()))?;
    increment_last_octet(ipv4)
}

/// `a.b.c.d` -> `a.b.c.(d+1)`; fails for `d == 255`
pub fn increment_last_octet(addr: Ipv4Addr) -> Result<Ipv4Addr, BmcError> {
    let [a, b, c, d] = addr.octets();
    let d = d
        .checked_add(1)
        .ok_or_else(|| BmcError::AddressDerivation(addr.to_string()))?;
    Ok(Ipv4Addr::new(a, b, c, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_last_octet() {
        let addr = increment_last_octet(Ipv4Addr::new(10, 8, 0, 21)).unwrap();
        assert_eq!(addr, Ipv4Addr::new(10, 8, 0, 22));
    }

    #[test]
    fn last_octet_255_is_rejected() {
        let err = increment_last_octet(Ipv4Addr::new(10, 8, 0, 255)).unwrap_err();
        assert!(matches!(err, BmcError::AddressDerivation(_)));
    }

    #[test]
    fn derives_from_literal_address() {
        assert_eq!(
            derive_bmc_address("192.168.5.40").unwrap(),
            Ipv4Addr::new(192, 168, 5, 41)
        );
    }

    #[test]
    fn explicit_address_wins() {
        let bmc =
            BmcDescriptor::resolve("192.168.5.40", Some("bmc-7.lab"), "root", "calvin").unwrap();
        assert_eq!(bmc.address, "bmc-7.lab");

        let derived = BmcDescriptor::resolve("192.168.5.40", None, "root", "calvin").unwrap();
        assert_eq!(derived.address, "192.168.5.41");
    }

    #[test]
    fn debug_hides_password() {
        let bmc = BmcDescriptor::new("10.0.0.2", "root", "calvin");
        assert!(!format!("{bmc:?}").contains("calvin"));
    }

    #[test]
    fn ipv6_only_address_is_resolve_error() {
        let err = derive_bmc_address("fd00::10").unwrap_err();
        match err {
            BmcError::Resolve { hostname, reason } => {
                assert_eq!(hostname, "fd00::10");
                assert_eq!(reason, "no IPv4 address");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
