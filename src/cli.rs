//! The command line interface for the program.
use crate::formulation::build_problem;
use crate::input::check_non_negative;
use crate::instance::{Instance, InstanceData, builtin_instance};
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{DataWriter, create_output_directory, write_instance};
use crate::report::write_report;
use crate::settings::Settings;
use crate::solution::FEASIBILITY_TOLERANCE;
use crate::solver::{SolveOutcome, solve};
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub mod instance;
use instance::InstanceSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands (`run` if none is given).
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Path to an instance file (the built-in instance is used if not given)
    #[arg(short, long)]
    pub instance: Option<PathBuf>,
    /// Directory for output files (none are written if not given)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Maximum time in seconds for the solver to run
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the solver stops
    #[arg(long)]
    pub mip_gap: Option<f64>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Formulate and solve an instance, then report the solution.
    Run {
        /// Run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate an instance without solving it.
    Validate {
        /// Path to the instance file (the built-in instance is used if not given)
        instance_path: Option<PathBuf>,
    },
    /// Inspect instances.
    Instance {
        /// The available subcommands for inspecting instances.
        #[command(subcommand)]
        subcommand: InstanceSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Run {
            opts: RunOpts::default(),
        }
    }
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { opts } => handle_run_command(&opts, None),
            Self::Validate { instance_path } => {
                handle_validate_command(instance_path.as_deref(), None)
            }
            Self::Instance { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ evsite --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    // With no subcommand, solve the built-in instance and report to stdout
    cli.command.unwrap_or_default().execute()
}

/// Read the instance data from a file, or use the built-in instance if no path is given
pub fn load_instance_data(instance_path: Option<&Path>) -> Result<InstanceData> {
    match instance_path {
        Some(path) => InstanceData::from_path(path),
        None => Ok(builtin_instance()),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(opts: &RunOpts, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let mut settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // These settings can be overridden by command-line arguments
    if opts.overwrite {
        settings.overwrite = true;
    }
    if let Some(time_limit) = opts.time_limit {
        settings.time_limit = time_limit;
    }
    if let Some(gap) = opts.mip_gap {
        settings.mip_rel_gap = gap;
    }
    ensure!(
        settings.time_limit > 0.0,
        "Time limit must be greater than zero (got {})",
        settings.time_limit
    );
    check_non_negative(settings.mip_rel_gap, "MIP gap")?;

    let overwrite = if let Some(output_path) = opts.output_dir.as_deref() {
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?
    } else {
        false
    };

    // Initialise program logger
    log::init(Some(&settings.log_level), opts.output_dir.as_deref())
        .context("Failed to initialise logging.")?;

    // Load the instance to solve
    let data = load_instance_data(opts.instance.as_deref()).context("Failed to load instance.")?;
    let instance = Instance::from_data(&data).context("Failed to load instance.")?;
    match opts.instance.as_deref() {
        Some(path) => info!("Loaded instance {} from {}", instance.name, path.display()),
        None => info!("Using built-in instance {}", instance.name),
    }
    if let Some(output_path) = opts.output_dir.as_deref() {
        info!("Output folder: {}", output_path.display());
    }

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let formulation = build_problem(&instance).context("Failed to formulate problem.")?;
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", formulation.structure)?;
    writeln!(stdout)?;

    let outcome = solve(formulation, &settings.solver_options())?;
    write_report(&mut stdout, &instance, &outcome)?;

    if let Some(solution) = &outcome.solution {
        if let Err(err) = solution.check_feasibility(&instance, FEASIBILITY_TOLERANCE) {
            warn!("Solution failed feasibility check: {err}");
        }
    } else {
        warn!("No optimal solution found (status {})", outcome.status);
    }

    if let Some(output_path) = opts.output_dir.as_deref() {
        write_output_files(output_path, opts.instance.as_deref(), &data, &instance, &outcome)
            .context("Failed to save output files.")?;
    }
    info!("Run complete!");

    Ok(())
}

/// Write the instance, run metadata and (if there is one) the solution to the output directory
fn write_output_files(
    output_path: &Path,
    instance_path: Option<&Path>,
    data: &InstanceData,
    instance: &Instance,
    outcome: &SolveOutcome,
) -> Result<()> {
    write_instance(output_path, data)?;
    write_metadata(output_path, &instance.name, instance_path, outcome)?;

    if let Some(solution) = &outcome.solution {
        let mut writer = DataWriter::create(output_path)?;
        writer.write_solution(instance, solution)?;
        writer.flush()?;
    }

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(
    instance_path: Option<&Path>,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load/validate the instance
    let data = load_instance_data(instance_path).context("Failed to validate instance.")?;
    let instance = Instance::from_data(&data).context("Failed to validate instance.")?;
    let formulation = build_problem(&instance).context("Failed to validate instance.")?;
    info!(
        "Instance {} is valid: {} variables, {} constraints",
        instance.name,
        formulation.structure.num_variables(),
        formulation.structure.num_constraints()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_runs_builtin_instance() {
        let cli = Cli::try_parse_from(["evsite"]).unwrap();
        let Commands::Run { opts } = cli.command.unwrap_or_default() else {
            panic!("Expected the run command");
        };
        assert!(opts.instance.is_none());
        assert!(opts.output_dir.is_none());
        assert!(!opts.overwrite);
        assert!(opts.time_limit.is_none());
        assert!(opts.mip_gap.is_none());
    }

    #[test]
    fn test_run_options() {
        let cli = Cli::try_parse_from([
            "evsite",
            "run",
            "--instance",
            "corridor.toml",
            "--time-limit",
            "60",
            "--mip-gap",
            "0.01",
        ])
        .unwrap();
        let Some(Commands::Run { opts }) = cli.command else {
            panic!("Expected the run command");
        };
        assert_eq!(opts.instance, Some(PathBuf::from("corridor.toml")));
        assert_eq!(opts.time_limit, Some(60.0));
        assert_eq!(opts.mip_gap, Some(0.01));
    }
}
