//! Program settings, read from `settings.toml` in the evsite config directory.
use crate::get_evsite_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use crate::solver::SolverOptions;
use anyhow::Result;
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# Program settings for evsite
# Uncomment a setting to change its value
";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_time_limit() -> f64 {
    f64::INFINITY
}

/// Same as the HiGHS default
fn default_mip_rel_gap() -> f64 {
    1e-4
}

/// Path of the settings file
pub fn get_settings_file_path() -> PathBuf {
    get_evsite_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings. Command-line options take precedence over these.
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// Maximum time in seconds the solver may run for
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// Relative MIP gap at which the solver stops
    #[serde(default = "default_mip_rel_gap")]
    pub mip_rel_gap: f64,
    /// Number of threads for the solver to use (0 lets the solver decide)
    #[serde(default)]
    pub threads: u32,
    /// Whether to show the solver's own log
    #[serde(default)]
    pub solver_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            time_limit: default_time_limit(),
            mip_rel_gap: default_mip_rel_gap(),
            threads: 0,
            solver_output: false,
        }
    }
}

impl Settings {
    /// Load the settings file, using defaults if there isn't one
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if file_path.is_file() {
            read_toml(file_path)
        } else {
            Ok(Settings::default())
        }
    }

    /// The solver options given by these settings
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            time_limit: self.time_limit.is_finite().then_some(self.time_limit),
            mip_rel_gap: Some(self.mip_rel_gap),
            threads: (self.threads > 0).then_some(self.threads),
            solver_output: self.solver_output,
        }
    }

    /// A settings file with every setting commented out and described by its doc comment
    pub fn default_file_contents() -> String {
        let settings_raw =
            toml::to_string(&Settings::default()).expect("Could not convert settings to TOML");

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.lines() {
            let Some((field, _)) = line.split_once('=') else {
                continue;
            };

            let docs = Settings::get_field_docs(field.trim()).expect("Missing doc comment for field");
            out.push('\n');
            for doc_line in docs.lines() {
                writeln!(out, "# # {}", doc_line.trim()).unwrap();
            }
            writeln!(out, "# {line}").unwrap();
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(
            &file_path,
            "log_level = \"warn\"\ntime_limit = 60.0\nthreads = 4\n",
        )
        .unwrap();

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                time_limit: 60.0,
                threads: 4,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_empty_file_matches_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_solver_options() {
        let options = Settings::default().solver_options();
        assert_eq!(options.time_limit, None);
        assert_eq!(options.mip_rel_gap, Some(1e-4));
        assert_eq!(options.threads, None);

        let settings = Settings {
            time_limit: 30.0,
            threads: 2,
            ..Settings::default()
        };
        let options = settings.solver_options();
        assert_eq!(options.time_limit, Some(30.0));
        assert_eq!(options.threads, Some(2));
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.contains("\n# # The default program log level\n# log_level = \"info\"\n"));
        assert!(contents.contains("# # Number of threads"));
    }
}
