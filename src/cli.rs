//! The command line interface for the cost evaluation.
use crate::evaluation;
use crate::input::load_scenario;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the cost evaluation.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Evaluate the costs of a scenario.
    Run {
        /// Path to the scenario directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example scenarios.
    Example {
        /// The available subcommands for managing example scenarios.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a scenario.
    Validate {
        /// The path to the scenario directory.
        model_dir: PathBuf,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // No command given: show the help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwrite =
        create_output_directory(output_path, allow_overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the scenario to evaluate
    let scenario = load_scenario(model_path).context("Failed to load scenario.")?;
    info!("Loaded scenario from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    evaluation::run(&scenario, output_path)?;
    info!("Evaluation complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    // Load/validate the scenario
    load_scenario(model_path).context("Failed to validate scenario.")?;
    info!("Scenario validation successful!");

    Ok(())
}
