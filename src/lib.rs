//! Siting and sizing of solar-backed EV charging infrastructure.
//!
//! A problem [`instance`] is formulated as a mixed-integer linear program ([`formulation`]), solved
//! with HiGHS ([`solver`]) and the resulting [`solution`] is summarised by the [`report`] module.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod formulation;
pub mod id;
pub mod input;
pub mod instance;
pub mod log;
pub mod output;
pub mod report;
pub mod settings;
pub mod solution;
pub mod solver;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the path to the evsite configuration directory
pub fn get_evsite_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        panic!("Could not get path to config directory for your platform");
    };
    config_dir.push("evsite");

    config_dir
}
