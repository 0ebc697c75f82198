//! labhost ping - Check which nodes answer a ping

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table};
use console::style;
use labhost_core::Config;
use labhost_core::host::LivenessProbe;
use labhost_core::inventory::{get_node, load_nodes, resolve_connection, select_nodes};

#[derive(Args)]
pub struct PingArgs {
    /// Node names (default: every node, narrowed by --only/--exclude)
    pub nodes: Vec<String>,

    /// Only these indices of the sorted node list (e.g. "0,2-4")
    #[arg(long, conflicts_with = "nodes")]
    pub only: Option<String>,

    /// Skip these indices
    #[arg(long, conflicts_with = "nodes")]
    pub exclude: Option<String>,
}

pub fn cmd_ping(args: &PingArgs, config: &Config, quiet: bool) -> Result<()> {
    let nodes = load_nodes()?;
    let names: Vec<&str> = if args.nodes.is_empty() {
        select_nodes(&nodes, args.only.as_deref(), args.exclude.as_deref())?
    } else {
        args.nodes.iter().map(String::as_str).collect()
    };

    if names.is_empty() {
        if !quiet {
            println!("No nodes selected.");
        }
        return Ok(());
    }

    let probe = config.probe();
    let mut table = Table::new();
    table.set_header(vec!["Name", "Address", "Status"]);
    let mut down = 0;

    for name in names {
        let node = get_node(&nodes, name)?;
        let hostname = resolve_connection(node, config).hostname;
        let alive = probe.is_alive(&hostname);
        tracing::debug!("{} ({}) alive: {}", name, hostname, alive);

        let status = if alive {
            Cell::new("up").fg(Color::Green)
        } else {
            down += 1;
            Cell::new("down").fg(Color::Red)
        };
        table.add_row(vec![Cell::new(name).fg(Color::Cyan), Cell::new(hostname), status]);
    }

    if !quiet {
        println!("{table}");
        if down > 0 {
            println!();
            println!("  {} {} node(s) not answering", style("Note:").yellow(), down);
        }
    }
    Ok(())
}
