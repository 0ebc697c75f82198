//! labhost-core - remote execution and host introspection for lab provisioning
//!
//! Provisioning code is written against the `Host` capability (`run`,
//! `read_file`, `write_file`) and does not care whether the target is the
//! local machine or a node reachable over SSH that may reboot under it.
//! Out-of-band power and ISO boot go through a node's BMC.

pub mod bmc;
pub mod config;
pub mod host;
pub mod inventory;
pub mod net;
pub mod range;
pub mod retry;
pub mod version;

pub use bmc::{BmcClient, BmcDescriptor, BmcError, PowerController, PowerOptions};
pub use config::{Config, load_config, save_config};
pub use host::{
    CommandResult, Host, HostError, LabHost, LocalHost, RemoteHost, RemoteHostWithContainer,
    SessionState,
};
pub use inventory::{InventoryError, NodeConfig, NodesFile, load_nodes, save_nodes};
pub use net::NetError;
pub use range::{RangeList, parse_index_list};
pub use retry::{Backoff, RetryPolicy};
pub use version::{get_version, get_version_long};
