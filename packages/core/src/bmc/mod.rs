//! Out-of-band power and boot control
//!
//! Talks to a node's management controller (BMC) over Redfish to mount
//! virtual media and change power state. Nothing here needs an SSH
//! session; `boot_iso_and_connect` only uses one after the boot.

mod controller;
mod descriptor;
mod error;
mod redfish;

pub use controller::{BmcClient, PowerController, PowerOptions, boot_iso_and_connect};
pub use descriptor::{BmcDescriptor, derive_bmc_address, increment_last_octet};
pub use error::BmcError;
pub use redfish::{
    RedfishClient, RedfishPaths, ResetType, boot_once_body, insert_media_body, reset_body,
};
