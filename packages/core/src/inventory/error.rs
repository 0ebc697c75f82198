//! Node inventory errors

use std::path::PathBuf;

use thiserror::Error;

use crate::bmc::BmcError;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Could not determine nodes file path")]
    NoPath,

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize nodes: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Node '{0}' not found. Run 'labhost node list' to see configured nodes.")]
    UnknownNode(String),

    #[error("Node '{0}' already exists")]
    DuplicateNode(String),

    /// Power actions need BMC credentials in the node entry
    #[error("Node '{0}' has no BMC configured")]
    NoBmc(String),

    #[error(transparent)]
    Bmc(#[from] BmcError),
}
