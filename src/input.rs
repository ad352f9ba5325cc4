//! Common routines for handling input data.
use anyhow::{Context, Result, ensure};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Check that a value is finite and not negative
pub fn check_non_negative(value: f64, what: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{what} must be a finite number greater than or equal to zero (got {value})"
    );

    Ok(())
}

/// Check that a value is finite and strictly positive
pub fn check_positive(value: f64, what: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{what} must be a finite number greater than zero (got {value})"
    );

    Ok(())
}

/// Check that a value lies between 0 and 1 (inclusive)
pub fn check_proportion(value: f64, what: &str) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{what} must be between 0 and 1 (got {value})"
    );

    Ok(())
}
