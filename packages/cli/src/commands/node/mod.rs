//! Node inventory subcommands

mod add;
mod list;
mod remove;
mod show;

use anyhow::Result;
use clap::{Args, Subcommand};
use labhost_core::Config;

pub use add::{NodeAddArgs, cmd_node_add};
pub use list::{NodeListArgs, cmd_node_list};
pub use remove::{NodeRemoveArgs, cmd_node_remove};
pub use show::{NodeShowArgs, cmd_node_show};

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    command: NodeCommands,
}

#[derive(Subcommand)]
enum NodeCommands {
    /// Add a node to the inventory
    Add(NodeAddArgs),
    /// List nodes
    List(NodeListArgs),
    /// Remove a node from the inventory
    Remove(NodeRemoveArgs),
    /// Show one node
    Show(NodeShowArgs),
}

pub fn cmd_node(args: NodeArgs, config: &Config, quiet: bool) -> Result<()> {
    match args.command {
        NodeCommands::Add(args) => cmd_node_add(&args, quiet),
        NodeCommands::List(args) => cmd_node_list(&args, config, quiet),
        NodeCommands::Remove(args) => cmd_node_remove(&args, quiet),
        NodeCommands::Show(args) => cmd_node_show(&args, config, quiet),
    }
}
