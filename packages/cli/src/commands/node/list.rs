//! labhost node list - List configured nodes

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table};
use console::style;
use labhost_core::Config;
use labhost_core::config::get_nodes_path;
use labhost_core::inventory::{load_nodes, select_nodes};

#[derive(Args)]
pub struct NodeListArgs {
    /// Filter by group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Only these indices of the sorted list (e.g. "0,2-4")
    #[arg(long)]
    pub only: Option<String>,

    /// Drop these indices (e.g. "1")
    #[arg(long)]
    pub exclude: Option<String>,

    /// Show only node names (for scripting)
    #[arg(long)]
    pub names_only: bool,
}

pub fn cmd_node_list(args: &NodeListArgs, config: &Config, quiet: bool) -> Result<()> {
    let nodes = load_nodes()?;

    if nodes.nodes.is_empty() {
        if !quiet && !args.names_only {
            println!("No nodes configured.");
            println!();
            println!(
                "  {} {}",
                style("Add one with:").dim(),
                style("labhost node add <name> <address>").yellow()
            );
        }
        return Ok(());
    }

    let selected: Vec<&str> = select_nodes(&nodes, args.only.as_deref(), args.exclude.as_deref())?
        .into_iter()
        .filter(|name| match &args.group {
            Some(group) => nodes.nodes_in_group(group).contains(name),
            None => true,
        })
        .collect();

    if args.names_only || quiet {
        for name in &selected {
            println!("{name}");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Address", "User", "Port", "Groups", "BMC"]);

    let all_names = nodes.node_names();
    for name in selected {
        let Some(node) = nodes.get_node(name) else {
            continue;
        };
        let index = all_names.iter().position(|n| *n == name).unwrap_or_default();
        let bmc = match &node.bmc {
            Some(bmc) => Cell::new(bmc.address.as_deref().unwrap_or("derived")),
            None => Cell::new("-").fg(Color::DarkGrey),
        };
        let groups = if node.groups.is_empty() {
            "-".to_string()
        } else {
            node.groups.join(", ")
        };

        table.add_row(vec![
            Cell::new(index),
            Cell::new(name).fg(Color::Cyan),
            Cell::new(&node.address),
            Cell::new(node.user.as_deref().unwrap_or(&config.ssh_user)),
            Cell::new(node.port.unwrap_or(config.ssh_port)),
            Cell::new(groups),
            bmc,
        ]);
    }

    println!("{table}");

    if let Some(path) = get_nodes_path() {
        println!();
        println!(
            "  {} {}",
            style("Nodes file:").dim(),
            style(path.display()).dim()
        );
    }

    Ok(())
}
