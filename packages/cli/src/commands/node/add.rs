//! labhost node add - Add a node to the inventory

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use labhost_core::host::query_ssh_config;
use labhost_core::inventory::{NodeConfig, load_nodes, save_nodes};

#[derive(Args)]
pub struct NodeAddArgs {
    /// Name to identify this node (e.g., "worker-1")
    pub name: String,

    /// Hostname, IP address or ~/.ssh/config alias
    pub address: String,

    /// SSH user (default: from SSH config, then config.json)
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH port (default: from SSH config, then config.json)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Primary private key
    #[arg(short, long)]
    pub identity_file: Option<PathBuf>,

    /// Key tried when the primary is rejected
    #[arg(long)]
    pub fallback_identity_file: Option<PathBuf>,

    /// Group/tag (can be specified multiple times)
    #[arg(short, long)]
    pub group: Vec<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// BMC address (default: node address + 1)
    #[arg(long, requires = "bmc_user")]
    pub bmc_address: Option<String>,

    /// BMC user; enables power and boot-iso for this node
    #[arg(long, requires = "bmc_password")]
    pub bmc_user: Option<String>,

    #[arg(long, requires = "bmc_user")]
    pub bmc_password: Option<String>,

    /// Overwrite if the node already exists
    #[arg(long)]
    pub force: bool,
}

pub fn cmd_node_add(args: &NodeAddArgs, quiet: bool) -> Result<()> {
    let mut nodes = load_nodes()?;

    if nodes.has_node(&args.name) && !args.force {
        bail!(
            "Node '{}' already exists. Use --force to overwrite, or choose a different name.",
            args.name
        );
    }

    let ssh_match = query_ssh_config(&args.address).unwrap_or_default();
    if !quiet && ssh_match.has_settings() {
        println!(
            "{} Found in ~/.ssh/config: {}",
            style("SSH Config:").cyan(),
            ssh_match.display_settings()
        );
    }

    let node = build_node(args);
    nodes.add_node(&args.name, node);
    save_nodes(&nodes)?;

    if !quiet {
        println!(
            "{} Node '{}' added ({})",
            style("\u{2713}").green(),
            style(&args.name).cyan(),
            args.address
        );
    }
    Ok(())
}

fn build_node(args: &NodeAddArgs) -> NodeConfig {
    let mut node = NodeConfig::new(&args.address);
    if let Some(user) = &args.user {
        node = node.with_user(user);
    }
    if let Some(port) = args.port {
        node = node.with_port(port);
    }
    if let Some(key) = &args.identity_file {
        node = node.with_identity_file(key);
    }
    node.fallback_identity_file = args.fallback_identity_file.clone();
    for group in &args.group {
        node = node.with_group(group);
    }
    if let Some(desc) = &args.description {
        node = node.with_description(desc);
    }
    if let (Some(user), Some(password)) = (&args.bmc_user, &args.bmc_password) {
        node = node.with_bmc(args.bmc_address.clone(), user, password);
    }
    node
}
