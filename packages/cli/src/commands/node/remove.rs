//! labhost node remove - Remove a node from the inventory

use anyhow::Result;
use clap::Args;
use console::style;
use labhost_core::inventory::{InventoryError, load_nodes, save_nodes};

#[derive(Args)]
pub struct NodeRemoveArgs {
    pub name: String,
}

pub fn cmd_node_remove(args: &NodeRemoveArgs, quiet: bool) -> Result<()> {
    let mut nodes = load_nodes()?;

    if nodes.remove_node(&args.name).is_none() {
        return Err(InventoryError::UnknownNode(args.name.clone()).into());
    }
    save_nodes(&nodes)?;

    if !quiet {
        println!(
            "{} Node '{}' removed",
            style("\u{2713}").green(),
            style(&args.name).cyan()
        );
    }
    Ok(())
}
