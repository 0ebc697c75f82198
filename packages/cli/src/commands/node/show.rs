//! labhost node show - Show one node with its effective connection settings

use anyhow::Result;
use clap::Args;
use console::style;
use labhost_core::Config;
use labhost_core::inventory::{NodeConfig, get_node, load_nodes, resolve_connection};

#[derive(Args)]
pub struct NodeShowArgs {
    pub name: String,

    /// Output as JSON (BMC password masked)
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_node_show(args: &NodeShowArgs, config: &Config, quiet: bool) -> Result<()> {
    let nodes = load_nodes()?;
    let node = get_node(&nodes, &args.name)?;

    if args.json || quiet {
        println!("{}", serde_json::to_string_pretty(&masked(node))?);
        return Ok(());
    }

    let settings = resolve_connection(node, config);

    println!("{}", style(&args.name).cyan().bold());
    println!();
    println!("  {:<15} {}", style("Address:").dim(), node.address);
    if settings.hostname != node.address {
        println!("  {:<15} {}", style("Resolves to:").dim(), settings.hostname);
    }
    println!("  {:<15} {}", style("User:").dim(), settings.user);
    println!("  {:<15} {}", style("Port:").dim(), settings.port);
    println!(
        "  {:<15} {}",
        style("Key:").dim(),
        settings.key_paths.primary.display()
    );
    println!(
        "  {:<15} {}",
        style("Fallback key:").dim(),
        settings.key_paths.fallback.display()
    );

    if !node.groups.is_empty() {
        println!("  {:<15} {}", style("Groups:").dim(), node.groups.join(", "));
    }
    if let Some(desc) = &node.description {
        println!("  {:<15} {}", style("Description:").dim(), desc);
    }
    match &node.bmc {
        Some(bmc) => println!(
            "  {:<15} {}@{}",
            style("BMC:").dim(),
            bmc.user,
            bmc.address.as_deref().unwrap_or("(address + 1)")
        ),
        None => println!("  {:<15} {}", style("BMC:").dim(), style("none").dim()),
    }

    println!();
    println!(
        "  {} {}",
        style("Test connection:").dim(),
        style(format!("labhost run {} -- hostname", args.name)).yellow()
    );
    Ok(())
}

fn masked(node: &NodeConfig) -> NodeConfig {
    let mut node = node.clone();
    if let Some(bmc) = node.bmc.as_mut() {
        bmc.password = "********".to_string();
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_masks_bmc_password() {
        let node = NodeConfig::new("10.0.0.5").with_bmc(None, "root", "calvin");
        let json = serde_json::to_string(&masked(&node)).unwrap();
        assert!(!json.contains("calvin"));
        assert!(json.contains("root"));
    }
}
