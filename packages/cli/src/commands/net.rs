//! labhost net - Inspect a node's interfaces and routes

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, Table};
use console::style;
use labhost_core::Config;
use labhost_core::net::{
    AddressEntry, carrier_no_addr, list_addresses, port_has_carrier, port_to_ip, route_to_port,
};

use super::connect_node;

#[derive(Args)]
pub struct NetArgs {
    /// Node name from the inventory
    pub node: String,

    /// SSH user override
    #[arg(short, long)]
    pub user: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub query: NetQuery,
}

#[derive(Subcommand)]
pub enum NetQuery {
    /// List interfaces with state and addresses
    Ports,
    /// Interfaces with carrier but no address
    Unconfigured,
    /// First IPv4 address of a port
    Ip { port: String },
    /// Device carrying the route to a destination
    Route {
        #[arg(default_value = "default")]
        destination: String,
    },
    /// Whether a port has link
    Carrier { port: String },
}

pub fn cmd_net(args: &NetArgs, config: &Config, quiet: bool) -> Result<()> {
    let (mut host, _) = connect_node(&args.node, config, args.user.as_deref(), quiet)?;

    match &args.query {
        NetQuery::Ports => {
            let entries = list_addresses(&mut host)?;
            print_entries(&entries, args.json)?;
        }
        NetQuery::Unconfigured => {
            let entries = carrier_no_addr(&mut host)?;
            print_entries(&entries, args.json)?;
        }
        NetQuery::Ip { port } => {
            let ip = port_to_ip(&mut host, port)?;
            print_value(ip.as_deref(), args.json, &format!("{port} has no IPv4 address"));
        }
        NetQuery::Route { destination } => {
            let device = route_to_port(&mut host, destination)?;
            print_value(
                device.as_deref(),
                args.json,
                &format!("no route to {destination}"),
            );
        }
        NetQuery::Carrier { port } => {
            let carrier = port_has_carrier(&mut host, port)?;
            if args.json {
                println!("{}", serde_json::json!({ "port": port, "carrier": carrier }));
            } else {
                println!("{carrier}");
            }
        }
    }

    host.close();
    Ok(())
}

fn print_value(value: Option<&str>, json: bool, missing: &str) {
    match (value, json) {
        (value, true) => println!("{}", serde_json::json!(value)),
        (Some(value), false) => println!("{value}"),
        (None, false) => eprintln!("{} {}", style("None:").yellow(), missing),
    }
}

fn print_entries(entries: &[AddressEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Index", "Interface", "Carrier", "Master", "Addresses"]);
    for entry in entries {
        let carrier = if entry.has_carrier() {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        let addresses: Vec<&str> = entry.addresses.iter().map(|a| a.local.as_str()).collect();
        table.add_row(vec![
            Cell::new(entry.interface_index),
            Cell::new(&entry.interface_name).fg(Color::Cyan),
            carrier,
            Cell::new(entry.master.as_deref().unwrap_or("-")),
            Cell::new(addresses.join(", ")),
        ]);
    }
    println!("{table}");
    Ok(())
}
