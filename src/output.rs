//! The module responsible for writing output data to disk.
use crate::instance::{Hour, Instance, InstanceData, SegmentID, SiteID};
use crate::solution::Solution;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::Path;

pub mod metadata;

/// The output file name for investment decisions
const SITE_DECISIONS_FILE_NAME: &str = "site_decisions.csv";

/// The output file name for energy served
const SERVED_ENERGY_FILE_NAME: &str = "served_energy.csv";

/// The output file name for hourly energy sources
const HOURLY_DISPATCH_FILE_NAME: &str = "hourly_dispatch.csv";

/// The output file name for the instance which was solved
const INSTANCE_FILE_NAME: &str = "instance.toml";

/// Create a new output directory.
///
/// If the directory already exists and is not empty, it is only reused if `overwrite` is set, in
/// which case its contents are deleted first.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        if output_dir.read_dir()?.next().is_none() {
            // Empty directory: nothing to overwrite
            return Ok(false);
        }

        ensure!(
            overwrite,
            "Output folder already exists and is not empty. Use --overwrite to overwrite it."
        );
        fs::remove_dir_all(output_dir)?;
        fs::create_dir_all(output_dir)?;
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Write the instance data to the output directory, so that the run can be reproduced
pub fn write_instance(output_path: &Path, data: &InstanceData) -> Result<()> {
    let file_path = output_path.join(INSTANCE_FILE_NAME);
    let contents = toml::to_string(data).context("Could not convert instance to TOML")?;
    fs::write(&file_path, contents)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(())
}

/// Represents a row of the site decisions CSV file: the number of units of one type at a site
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SiteDecisionRow {
    site_id: SiteID,
    open: bool,
    equipment: String,
    equipment_type: String,
    units: u32,
}

/// Represents a row of the served energy CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ServedEnergyRow {
    site_id: SiteID,
    hour: Hour,
    segment_id: SegmentID,
    demand: f64,
    served: f64,
    unmet: f64,
}

/// Represents a row of the hourly dispatch CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct HourlyDispatchRow {
    site_id: SiteID,
    hour: Hour,
    served: f64,
    grid: f64,
    solar_available: f64,
}

/// An object for writing the solution to CSV files
pub struct DataWriter {
    site_decisions_writer: csv::Writer<File>,
    served_energy_writer: csv::Writer<File>,
    hourly_dispatch_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            site_decisions_writer: new_writer(SITE_DECISIONS_FILE_NAME)?,
            served_energy_writer: new_writer(SERVED_ENERGY_FILE_NAME)?,
            hourly_dispatch_writer: new_writer(HOURLY_DISPATCH_FILE_NAME)?,
        })
    }

    /// Write the numbers of panels and chargers installed at each site
    pub fn write_site_decisions(&mut self, instance: &Instance, solution: &Solution) -> Result<()> {
        for site_id in &instance.sites {
            let open = solution.is_open(site_id);
            let mut write_row = |equipment: &str, equipment_type: String, units| {
                self.site_decisions_writer.serialize(SiteDecisionRow {
                    site_id: site_id.clone(),
                    open,
                    equipment: equipment.to_string(),
                    equipment_type,
                    units,
                })
            };

            for panel_id in &instance.panel_types {
                let units = solution.panel_count(site_id, panel_id).value() as u32;
                write_row("panel", panel_id.to_string(), units)?;
            }
            for charger_id in &instance.charger_types {
                let units = solution.charger_count(site_id, charger_id).value() as u32;
                write_row("charger", charger_id.to_string(), units)?;
            }
        }

        Ok(())
    }

    /// Write the demand, energy served and unmet demand for every site, hour and segment
    pub fn write_served_energy(&mut self, instance: &Instance, solution: &Solution) -> Result<()> {
        for ((site_id, hour, segment_id), demand) in &instance.demand {
            let served = solution.served(site_id, *hour, segment_id);
            let row = ServedEnergyRow {
                site_id: site_id.clone(),
                hour: *hour,
                segment_id: segment_id.clone(),
                demand: demand.value(),
                served: served.value(),
                unmet: (*demand - served).value(),
            };
            self.served_energy_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the energy served, grid purchases and available solar energy for every site and hour
    pub fn write_hourly_dispatch(&mut self, instance: &Instance, solution: &Solution) -> Result<()> {
        for site_id in &instance.sites {
            for hour in instance.hours() {
                let row = HourlyDispatchRow {
                    site_id: site_id.clone(),
                    hour,
                    served: solution.served_at(instance, site_id, hour).value(),
                    grid: solution.grid_draw(site_id, hour).value(),
                    solar_available: solution.solar_available(instance, site_id, hour)?.value(),
                };
                self.hourly_dispatch_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Write all solution files
    pub fn write_solution(&mut self, instance: &Instance, solution: &Solution) -> Result<()> {
        self.write_site_decisions(instance, solution)?;
        self.write_served_energy(instance, solution)?;
        self.write_hourly_dispatch(instance, solution)?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.site_decisions_writer.flush()?;
        self.served_energy_writer.flush()?;
        self.hourly_dispatch_writer.flush()?;

        Ok(())
    }
}
