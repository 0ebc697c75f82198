//! CLI command implementations

mod boot;
mod config;
mod net;
mod node;
mod ping;
mod power;
mod run;

use anyhow::{Context, Result};
use labhost_core::Config;
use labhost_core::host::RemoteHost;
use labhost_core::inventory::{
    ConnectionSettings, NodeConfig, get_node, load_nodes, remote_host_for, resolve_connection,
};

use crate::output::CommandSpinner;

pub use boot::{BootArgs, cmd_boot_iso};
pub use config::{ConfigArgs, cmd_config};
pub use net::{NetArgs, cmd_net};
pub use node::{NodeArgs, cmd_node};
pub use ping::{PingArgs, cmd_ping};
pub use power::{PowerArgs, cmd_power};
pub use run::{RunArgs, cmd_run};

/// Inventory entry for `name`
fn lookup_node(name: &str) -> Result<NodeConfig> {
    let nodes = load_nodes()?;
    Ok(get_node(&nodes, name)?.clone())
}

/// Connect to a node, waiting as long as it takes for it to answer
///
/// `user` overrides the inventory/SSH config/default user.
fn connect_node(
    name: &str,
    config: &Config,
    user: Option<&str>,
    quiet: bool,
) -> Result<(RemoteHost, ConnectionSettings)> {
    let node = lookup_node(name)?;
    let mut settings = resolve_connection(&node, config);
    if let Some(user) = user {
        settings.user = user.to_string();
    }

    let mut host = remote_host_for(&settings, config);
    let target = format!("{}@{}", settings.user, settings.hostname);
    let spinner = CommandSpinner::new_maybe(&format!("Connecting to {target}..."), quiet);

    match host.ssh_connect(&settings.user) {
        Ok(()) => spinner.success(&format!("Connected to {target}")),
        Err(e) => {
            spinner.fail(&format!("Could not connect to {target}"));
            return Err(e).with_context(|| format!("Failed to connect to node '{name}'"));
        }
    }

    Ok((host, settings))
}
