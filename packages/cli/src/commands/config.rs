//! labhost config - Show configuration

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, Table};
use console::style;
use labhost_core::Config;
use labhost_core::config::{get_config_path, get_nodes_path};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config and nodes file paths
    Path,
}

pub fn cmd_config(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.command {
        Some(ConfigSubcommands::Show { json: true }) => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        Some(ConfigSubcommands::Show { json: false }) | None => show_table(config)?,
        Some(ConfigSubcommands::Path) => {
            if let Some(path) = get_config_path() {
                println!("{}", path.display());
            }
            if let Some(path) = get_nodes_path() {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn show_table(config: &Config) -> Result<()> {
    let value = serde_json::to_value(config)?;
    let mut table = Table::new();
    table.set_header(vec!["Key", "Value"]);

    if let Some(map) = value.as_object() {
        for (key, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            table.add_row(vec![Cell::new(key).fg(Color::Cyan), Cell::new(text)]);
        }
    }

    println!("{table}");
    if let Some(path) = get_config_path() {
        println!();
        println!(
            "  {} {}",
            style("Config file:").dim(),
            style(path.display()).dim()
        );
    }
    Ok(())
}
