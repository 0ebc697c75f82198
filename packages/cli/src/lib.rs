//! labhost CLI - drive lab nodes over SSH and their BMCs over Redfish
//!
//! Thin layer over `labhost-core`: loads configuration and the node
//! inventory, builds hosts and controllers, prints results.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use labhost_core::{config, get_version, get_version_long, load_config};
use tracing_subscriber::EnvFilter;

/// Drive lab nodes over SSH and their BMCs over Redfish
#[derive(Parser)]
#[command(name = "labhost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drive lab nodes over SSH and their BMCs over Redfish", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase verbosity level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the node inventory
    Node(commands::NodeArgs),
    /// Run a command on a node, locally, or in the node's helper container
    Run(commands::RunArgs),
    /// Check which nodes answer a ping
    Ping(commands::PingArgs),
    /// Inspect a node's interfaces and routes
    Net(commands::NetArgs),
    /// Boot a node from an ISO through its BMC
    BootIso(commands::BootArgs),
    /// Change a node's power state through its BMC
    Power(commands::PowerArgs),
    /// Show configuration
    Config(commands::ConfigArgs),
}

/// Install the tracing subscriber; RUST_LOG overrides the flag-derived level
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    let config_path = config::get_config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    // Creates a default config on first run
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Configuration error", style("Error:").red().bold());
            eprintln!();
            eprintln!("  {e:#}");
            eprintln!();
            eprintln!("  Config file: {}", style(config_path.display()).yellow());
            eprintln!();
            eprintln!(
                "  {} Check the config file for syntax errors or unknown fields.",
                style("Tip:").cyan()
            );
            std::process::exit(1);
        }
    };

    if cli.verbose > 0 {
        eprintln!(
            "{} Config: {}",
            style("[info]").cyan(),
            config_path.display()
        );
    }

    match cli.command {
        Some(Commands::Node(args)) => commands::cmd_node(args, &config, cli.quiet),
        Some(Commands::Run(args)) => commands::cmd_run(&args, &config, cli.quiet),
        Some(Commands::Ping(args)) => commands::cmd_ping(&args, &config, cli.quiet),
        Some(Commands::Net(args)) => commands::cmd_net(&args, &config, cli.quiet),
        Some(Commands::BootIso(args)) => commands::cmd_boot_iso(&args, &config, cli.quiet),
        Some(Commands::Power(args)) => commands::cmd_power(&args, &config, cli.quiet),
        Some(Commands::Config(args)) => commands::cmd_config(args, &config),
        None => {
            if !cli.quiet {
                let version = if cli.verbose > 0 {
                    get_version_long()
                } else {
                    get_version()
                };
                println!(
                    "{} {}",
                    style("labhost").cyan().bold(),
                    style(version).dim()
                );
                println!();
                println!("Run {} for available commands.", style("--help").green());
            }
            Ok(())
        }
    }
}
