//! labhost run - Run a command on a node, locally, or in the node's container

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use labhost_core::host::{Host, LabHost, LocalHost, RemoteHostWithContainer};
use labhost_core::{CommandResult, Config};
use tracing::Level;

use super::connect_node;
use crate::output::{exit_code_style, format_elapsed};

#[derive(Args)]
pub struct RunArgs {
    /// Node name from the inventory
    #[arg(required_unless_present = "local", conflicts_with = "local")]
    pub node: Option<String>,

    /// Run on this machine instead of a node
    #[arg(long)]
    pub local: bool,

    /// Run inside the node's helper container (started if needed)
    #[arg(long, conflicts_with = "local")]
    pub in_container: bool,

    /// Allocate a TTY for the container exec
    #[arg(long, requires = "in_container")]
    pub interactive: bool,

    /// SSH user override
    #[arg(short, long)]
    pub user: Option<String>,

    /// Command and arguments, after `--`
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

pub fn cmd_run(args: &RunArgs, config: &Config, quiet: bool) -> Result<()> {
    let command = command_line(&args.command)?;
    let mut host = open_host(args, config, quiet)?;

    let started = Instant::now();
    let result = execute(&mut host, &command, args.interactive)
        .with_context(|| format!("Failed to run '{}' on {}", command, host.name()))?;
    host.close();

    print_result(&result, quiet);
    if !quiet {
        eprintln!(
            "{} exit {} after {}",
            style("Done:").dim(),
            exit_code_style(result.exit_code()),
            format_elapsed(started.elapsed())
        );
    }

    if !result.success() {
        std::process::exit(result.exit_code().clamp(1, 255));
    }
    Ok(())
}

/// Rejoin argv so word boundaries survive the remote shell and local split
fn command_line(argv: &[String]) -> Result<String> {
    shlex::try_join(argv.iter().map(String::as_str))
        .map_err(|e| anyhow::anyhow!("Cannot quote command {:?}: {}", argv, e))
}

fn open_host(args: &RunArgs, config: &Config, quiet: bool) -> Result<LabHost> {
    let Some(node) = args.node.as_deref().filter(|_| !args.local) else {
        return Ok(LabHost::Local(LocalHost::new()));
    };

    let (remote, _) = connect_node(node, config, args.user.as_deref(), quiet)?;
    if args.in_container {
        Ok(LabHost::Container(RemoteHostWithContainer::new(
            remote,
            config.container_spec(),
        )))
    } else {
        Ok(LabHost::Remote(remote))
    }
}

/// Output is echoed at DEBUG while streaming and printed once complete
fn execute(host: &mut LabHost, command: &str, interactive: bool) -> Result<CommandResult> {
    let result = match host {
        LabHost::Container(container) => container.run_in_container(command, interactive)?,
        other => other.run_logged(command, Level::DEBUG)?,
    };
    Ok(result)
}

fn print_result(result: &CommandResult, quiet: bool) {
    if !result.stdout().is_empty() {
        print!("{}", result.stdout());
    }
    if !result.stderr().is_empty() && (!quiet || !result.success()) {
        eprint!("{}", result.stderr());
    }
}
