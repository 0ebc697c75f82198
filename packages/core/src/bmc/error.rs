//! Out-of-band controller errors

use thiserror::Error;

use crate::host::HostError;

/// Errors from power and boot actions against a BMC
#[derive(Error, Debug)]
pub enum BmcError {
    /// Transport-level HTTP failure
    #[error("Redfish request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The controller answered with a non-success status
    #[error("Redfish request to {address} failed (HTTP {status}): {body}")]
    Http {
        address: String,
        status: u16,
        body: String,
    },

    /// The node's hostname did not resolve
    #[error("Failed to resolve {hostname}: {reason}")]
    Resolve { hostname: String, reason: String },

    /// The node's address cannot be turned into a BMC address
    #[error("Cannot derive BMC address from {0}")]
    AddressDerivation(String),

    /// The boot sequence failed on every allowed attempt
    #[error("Booting ISO through {address} failed after {attempts} attempts: {last}")]
    BootExhausted {
        address: String,
        attempts: u32,
        last: String,
    },

    /// Reconnecting to the node after boot failed
    #[error(transparent)]
    Host(#[from] HostError),
}
