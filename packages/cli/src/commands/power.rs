//! labhost power - Change a node's power state through its BMC

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use labhost_core::Config;
use labhost_core::inventory::power_controller_for;

use super::lookup_node;
use crate::output::CommandSpinner;

#[derive(Args)]
pub struct PowerArgs {
    /// Node name from the inventory
    pub node: String,

    pub action: PowerAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PowerAction {
    On,
    /// Force off
    Off,
    /// Force off, wait, power on
    Cycle,
}

impl PowerAction {
    fn verb(self) -> &'static str {
        match self {
            PowerAction::On => "Powering on",
            PowerAction::Off => "Powering off",
            PowerAction::Cycle => "Power cycling",
        }
    }
}

pub fn cmd_power(args: &PowerArgs, config: &Config, quiet: bool) -> Result<()> {
    let node = lookup_node(&args.node)?;
    let controller = power_controller_for(&args.node, &node, config)?;

    let spinner = CommandSpinner::new_maybe(
        &format!("{} {} via {}...", args.action.verb(), args.node, controller.address()),
        quiet,
    );

    let outcome = match args.action {
        PowerAction::On => controller.start(),
        PowerAction::Off => controller.stop(),
        PowerAction::Cycle => controller.cold_boot(),
    };

    match outcome {
        Ok(()) => {
            spinner.success(&format!("{} {}: done", args.action.verb(), args.node));
            Ok(())
        }
        Err(e) => {
            spinner.fail(&format!("{} {} failed", args.action.verb(), args.node));
            Err(e).with_context(|| format!("BMC of '{}' rejected the request", args.node))
        }
    }
}
