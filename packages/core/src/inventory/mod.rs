//! Node inventory
//!
//! Named lab machines from nodes.json, and the glue that turns an entry
//! into a ready-to-connect `RemoteHost` or a `PowerController`.

mod error;
mod schema;
mod storage;

use crate::bmc::{BmcDescriptor, PowerController};
use crate::config::Config;
use crate::host::{RemoteHost, SshConfigMatch, SshTarget, query_ssh_config};
use crate::range::{RangeList, RangeParseError, parse_index_list};

pub use error::InventoryError;
pub use schema::{BmcConfig, ConnectionSettings, NodeConfig, NodesFile};
pub use storage::{load_nodes, load_nodes_from, save_nodes, save_nodes_to};

/// Look up `name`
pub fn get_node<'a>(nodes: &'a NodesFile, name: &str) -> Result<&'a NodeConfig, InventoryError> {
    nodes
        .get_node(name)
        .ok_or_else(|| InventoryError::UnknownNode(name.to_string()))
}

/// Connection settings for `node`, consulting ~/.ssh/config
///
/// An unreadable SSH config is logged and ignored.
pub fn resolve_connection(node: &NodeConfig, config: &Config) -> ConnectionSettings {
    let ssh = query_ssh_config(&node.address).unwrap_or_else(|e| {
        tracing::warn!("Ignoring SSH config: {}", e);
        SshConfigMatch::default()
    });
    node.connection_settings(config, &ssh)
}

/// Unconnected `RemoteHost` using the configured transport and policies
pub fn remote_host_for(settings: &ConnectionSettings, config: &Config) -> RemoteHost {
    let mut options = config.remote_options();
    options.key_paths = settings.key_paths.clone();
    RemoteHost::with_parts(
        SshTarget::new(&settings.hostname).with_port(settings.port),
        config.ssh_connector(),
        config.probe(),
        options,
    )
}

/// Redfish controller for the node's BMC
///
/// A derived BMC address is computed from the host SSH connects to, so
/// `~/.ssh/config` aliases resolve first.
pub fn power_controller_for(
    name: &str,
    node: &NodeConfig,
    config: &Config,
) -> Result<PowerController, InventoryError> {
    let settings = resolve_connection(node, config);
    let descriptor = bmc_descriptor_for(name, node, &settings)?;
    Ok(PowerController::redfish(
        descriptor,
        config.redfish_paths(),
        config.bmc_request_timeout(),
        config.power_options(),
    )?)
}

/// BMC address and credentials for `node`, deriving from `settings.hostname`
pub fn bmc_descriptor_for(
    name: &str,
    node: &NodeConfig,
    settings: &ConnectionSettings,
) -> Result<BmcDescriptor, InventoryError> {
    let bmc = node
        .bmc
        .as_ref()
        .ok_or_else(|| InventoryError::NoBmc(name.to_string()))?;
    let descriptor = BmcDescriptor::resolve(
        &settings.hostname,
        bmc.address.as_deref(),
        &bmc.user,
        &bmc.password,
    )?;
    tracing::debug!("BMC for {} is {}", name, descriptor.address);
    Ok(descriptor)
}

/// Pick nodes by index into the sorted name list
///
/// `only` restricts the starting set (default: all nodes); `exclude` is then
/// removed from it. Both take lists like `0,2-4`.
pub fn select_nodes<'a>(
    nodes: &'a NodesFile,
    only: Option<&str>,
    exclude: Option<&str>,
) -> Result<Vec<&'a str>, RangeParseError> {
    let mut selector = match only {
        Some(list) => RangeList::with_initial(parse_index_list(list)?),
        None => RangeList::new(),
    };
    if let Some(list) = exclude {
        selector.exclude(parse_index_list(list)?);
    }
    let names = nodes.node_names();
    Ok(selector.filter(&names).into_iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;

    fn lab() -> NodesFile {
        let mut nodes = NodesFile::new();
        for (i, name) in ["n0", "n1", "n2", "n3"].iter().enumerate() {
            nodes.add_node(*name, NodeConfig::new(format!("10.0.0.{}", 10 + i)));
        }
        nodes
    }

    #[test]
    fn select_all_by_default() {
        let nodes = lab();
        assert_eq!(
            select_nodes(&nodes, None, None).unwrap(),
            vec!["n0", "n1", "n2", "n3"]
        );
    }

    #[test]
    fn select_only_then_exclude() {
        let nodes = lab();
        assert_eq!(
            select_nodes(&nodes, Some("0-2"), Some("1")).unwrap(),
            vec!["n0", "n2"]
        );
        assert_eq!(
            select_nodes(&nodes, None, Some("0,3")).unwrap(),
            vec!["n1", "n2"]
        );
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let nodes = lab();
        assert_eq!(select_nodes(&nodes, Some("3-9"), None).unwrap(), vec!["n3"]);
    }

    #[test]
    fn bad_selector_is_an_error() {
        let nodes = lab();
        assert!(select_nodes(&nodes, Some("a-b"), None).is_err());
    }

    #[test]
    fn unknown_node_is_reported() {
        let nodes = lab();
        assert!(get_node(&nodes, "n1").is_ok());
        assert!(matches!(
            get_node(&nodes, "n9"),
            Err(InventoryError::UnknownNode(_))
        ));
    }

    #[test]
    fn power_needs_bmc_entry() {
        let config = Config::default();
        let node = NodeConfig::new("10.0.0.10");
        assert!(matches!(
            power_controller_for("n0", &node, &config),
            Err(InventoryError::NoBmc(_))
        ));

        let node = node.with_bmc(None, "root", "calvin");
        let controller = power_controller_for("n0", &node, &config).unwrap();
        assert_eq!(controller.address(), "10.0.0.11");
    }

    #[test]
    fn bmc_address_derives_from_ssh_config_host_name() {
        let config = Config::default();
        let node = NodeConfig::new("labnode7").with_bmc(None, "root", "calvin");
        let ssh = SshConfigMatch {
            host_name: Some("10.0.0.10".to_string()),
            ..SshConfigMatch::default()
        };
        let settings = node.connection_settings(&config, &ssh);

        let descriptor = bmc_descriptor_for("labnode7", &node, &settings).unwrap();
        assert_eq!(descriptor.address, "10.0.0.11");
        assert_eq!(descriptor.username, "root");
    }

    #[test]
    fn explicit_bmc_address_skips_derivation() {
        let config = Config::default();
        let node = NodeConfig::new("labnode7").with_bmc(
            Some("bmc-7.lab".to_string()),
            "root",
            "calvin",
        );
        let settings = node.connection_settings(&config, &SshConfigMatch::default());

        let descriptor = bmc_descriptor_for("labnode7", &node, &settings).unwrap();
        assert_eq!(descriptor.address, "bmc-7.lab");
    }

    #[test]
    fn remote_host_uses_resolved_settings() {
        let config = Config::default();
        let node = NodeConfig::new("10.0.0.10").with_port(2222).with_user("root");
        let settings = node.connection_settings(&config, &SshConfigMatch::default());

        let host = remote_host_for(&settings, &config);
        assert_eq!(host.name(), "10.0.0.10");
        assert_eq!(host.target().port, 2222);
    }
}
