//! Network introspection errors

use thiserror::Error;

use crate::host::HostError;

/// Errors from querying a host's network state
///
/// An interface or route that does not exist is not an error; queries
/// return `None` or an empty list for that.
#[derive(Error, Debug)]
pub enum NetError {
    /// Running the listing command failed
    #[error(transparent)]
    Host(#[from] HostError),

    /// `ip -json` output did not have the expected shape
    #[error("Failed to parse ip output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),
}
