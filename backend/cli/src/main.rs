mod check_cmd;
mod config_cmd;
mod intake_cmd;
mod report_view;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use labelcheck_config::{config_dir, config_file_path, load_and_prepare, log_validation};
use labelcheck_logging::init_logger;

use crate::terminal_output::note_error;

#[derive(Parser)]
#[command(name = "labelcheck")]
#[command(about = "Check supplement labels against labelling regulations")]
#[command(version)]
struct Cli {
    /// Config file (default: $LABELCHECK_CONFIG_DIR/config.yaml or ~/.labelcheck/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a label image or PDF and run the full compliance check.
    ///
    /// Exit status: 0 compliant, 1 findings block compliance, 2 the check could not run.
    Check {
        /// JPG, PNG or PDF file, at most 10 MB
        file: PathBuf,
        /// Save the PDF report to this file or directory
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the session snapshot as JSON instead of the rendered report
        #[arg(long)]
        json: bool,
    },
    /// Only run the local intake decision for a file
    Intake {
        file: PathBuf,
    },
    /// Print the effective configuration and its validation report
    Config,
}

/// Exit status when the command could not run at all. Status 1 is reserved
/// for a check whose findings block compliance.
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    exit_status(run(Cli::parse()).await)
}

fn exit_status(result: Result<ExitCode>) -> ExitCode {
    result.unwrap_or_else(|err| {
        tracing::error!(error = %format!("{err:#}"), "Command failed");
        note_error(&format!("{err:#}"));
        ExitCode::from(EXIT_FAILURE)
    })
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let path = cli.config.unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path).await?;

    let _log_guard = init_logger(config.log_level(), config.log_dir())?;
    let report = log_validation(&config);

    match cli.command {
        Commands::Check { file, export, json } => {
            if !report.is_valid() {
                bail!("Configuration at {} is invalid; run `labelcheck config` for details", path.display());
            }
            check_cmd::run(&config, &file, export.as_deref(), json).await
        }
        Commands::Intake { file } => intake_cmd::run(&config, &file).await,
        Commands::Config => config_cmd::run(&config, &path, &report),
    }
}
