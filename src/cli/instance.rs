//! Code related to the CLI commands for inspecting instances
use super::load_instance_data;
use crate::instance::{Instance, builtin_instance};
use crate::report::{SiteSegmentTable, format_thousands};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

/// Subcommands for instances
#[derive(Subcommand)]
pub enum InstanceSubcommands {
    /// Write the built-in instance to the console in TOML format
    Dump,
    /// Show a summary of an instance's daily demand
    Show {
        /// Path to the instance file (the built-in instance is used if not given)
        instance_path: Option<PathBuf>,
    },
}

impl InstanceSubcommands {
    /// Execute the supplied instance subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Dump => handle_dump_command()?,
            Self::Show { instance_path } => handle_show_command(instance_path.as_deref())?,
        }

        Ok(())
    }
}

/// Handle the `dump` command
fn handle_dump_command() -> Result<()> {
    let contents =
        toml::to_string(&builtin_instance()).context("Could not convert instance to TOML")?;
    print!("{contents}");

    Ok(())
}

/// Handle the `show` command
fn handle_show_command(instance_path: Option<&Path>) -> Result<()> {
    let data = load_instance_data(instance_path)?;
    let instance = Instance::from_data(&data)?;
    let demand = SiteSegmentTable::demand(&instance)?;

    println!("Instance: {}", instance.name);
    println!(
        "{} sites, {} segments, {} panel types, {} charger types, {} hours",
        instance.sites.len(),
        instance.segments.len(),
        instance.panel_types.len(),
        instance.charger_types.len(),
        instance.num_hours
    );
    println!(
        "Capital budget: {}",
        format_thousands(instance.capex_budget.value(), 0)
    );
    println!(
        "\nDaily demand (kWh) by site and segment (total {}):",
        format_thousands(demand.grand_total().value(), 1)
    );
    print!("{demand}");

    Ok(())
}
