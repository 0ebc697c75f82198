//! labhost boot-iso - Boot a node from an ISO through its BMC

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use labhost_core::Config;
use labhost_core::bmc::boot_iso_and_connect;
use labhost_core::inventory::{power_controller_for, remote_host_for, resolve_connection};

use super::lookup_node;
use crate::output::{CommandSpinner, format_elapsed};

#[derive(Args)]
pub struct BootArgs {
    /// Node name from the inventory
    pub node: String,

    /// ISO URL the BMC can fetch (http/https/nfs)
    pub iso: String,

    /// Wait for the node to come back and open SSH as this user
    #[arg(long, value_name = "USER")]
    pub connect_as: Option<String>,
}

pub fn cmd_boot_iso(args: &BootArgs, config: &Config, quiet: bool) -> Result<()> {
    let node = lookup_node(&args.node)?;
    let controller = power_controller_for(&args.node, &node, config)?;

    let started = Instant::now();
    let spinner = CommandSpinner::new_maybe(
        &format!(
            "Booting {} from {} via {}...",
            args.node,
            args.iso,
            controller.address()
        ),
        quiet,
    );

    let outcome = if let Some(user) = &args.connect_as {
        let mut settings = resolve_connection(&node, config);
        settings.user = user.clone();
        let mut host = remote_host_for(&settings, config);
        spinner.update(&format!(
            "Booting {} and waiting for {}@{}...",
            args.node, settings.user, settings.hostname
        ));
        boot_iso_and_connect(&mut host, &controller, &args.iso, &settings.user)
    } else {
        controller.boot_iso(&args.iso)
    };

    let elapsed = format_elapsed(started.elapsed());
    match outcome {
        Ok(()) => {
            let done = if args.connect_as.is_some() {
                "booted and reachable"
            } else {
                "booting"
            };
            spinner.success(&format!("{} {} ({})", args.node, done, elapsed));
        }
        Err(e) => {
            spinner.fail(&format!("Boot of {} failed after {}", args.node, elapsed));
            return Err(e).with_context(|| format!("Failed to boot '{}' from ISO", args.node));
        }
    }

    if !quiet && args.connect_as.is_none() {
        println!(
            "  {} {}",
            style("Next:").dim(),
            style(format!("labhost run {} -- cat /etc/os-release", args.node)).yellow()
        );
    }
    Ok(())
}
