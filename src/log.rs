//! The program logger.
//!
//! Messages at info level and below go to stdout and warnings and errors go to stderr, coloured
//! when writing to a terminal. When a log directory is given, messages are also saved to
//! `evsite_info.log` and `evsite_error.log` there.
use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Log level used when neither `EVSITE_LOG_LEVEL` nor the settings file sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVEL_ENV_VAR: &str = "EVSITE_LOG_LEVEL";
const LOG_INFO_FILE_NAME: &str = "evsite_info.log";
const LOG_ERROR_FILE_NAME: &str = "evsite_error.log";

/// Whether [`init`] has completed
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger.
///
/// The level is taken from `EVSITE_LOG_LEVEL` if set, otherwise from `log_level_from_settings`.
/// Valid levels are `off`, `error`, `warn`, `info`, `debug` and `trace`. The logger can only be
/// initialised once per process.
pub fn init(log_level_from_settings: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    let log_level = match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(level) => parse_log_level(&level)
            .with_context(|| format!("Invalid value for {LOG_LEVEL_ENV_VAR}"))?,
        Err(_) => parse_log_level(log_level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL))?,
    };

    let mut dispatch = Dispatch::new()
        .chain(
            console_dispatch(std::io::stdout().is_terminal())
                .filter(is_below_warn)
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            console_dispatch(std::io::stderr().is_terminal())
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(log_dir) = log_dir {
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .filter(is_below_warn)
                    .format(write_log_plain)
                    .level(log_level.max(LevelFilter::Info))
                    .chain(create_log_file(log_dir, LOG_INFO_FILE_NAME)?),
            )
            .chain(
                Dispatch::new()
                    .format(write_log_plain)
                    .level(LevelFilter::Warn)
                    .chain(create_log_file(log_dir, LOG_ERROR_FILE_NAME)?),
            );
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT
        .set(())
        .map_err(|()| anyhow!("Logger already initialised"))
}

/// Convert a log level name (case insensitive) to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

fn is_below_warn(metadata: &Metadata) -> bool {
    metadata.level() > LevelFilter::Warn
}

/// Create (or truncate) a log file in `log_dir`
fn create_log_file(log_dir: &Path, file_name: &str) -> Result<File> {
    let path = log_dir.join(file_name);
    File::create(&path).with_context(|| format!("Could not create log file {}", path.display()))
}

/// A dispatch which formats messages for the console
fn console_dispatch(use_colour: bool) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    Dispatch::new().format(move |out, message, record| {
        if use_colour {
            write_log(out, colours.color(record.level()), record.target(), message);
        } else {
            write_log_plain(out, message, record);
        }
    })
}

/// Write a log message with a timestamp, level and target
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("warn", LevelFilter::Warn)]
    #[case("INFO", LevelFilter::Info)]
    #[case("Debug", LevelFilter::Debug)]
    fn test_parse_log_level(#[case] name: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_log_level(name).unwrap(), expected);
    }

    #[test]
    fn test_parse_log_level_unknown() {
        assert_eq!(
            parse_log_level("verbose").unwrap_err().to_string(),
            "Unknown log level: verbose"
        );
    }

    #[test]
    fn test_create_log_file_truncates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LOG_INFO_FILE_NAME), "old run").unwrap();

        create_log_file(dir.path(), LOG_INFO_FILE_NAME).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(LOG_INFO_FILE_NAME)).unwrap(),
            ""
        );
    }
}
