use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dxlbootstrap_cli::commands::{handle_generate, handle_sample_config, handle_templates};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "dxlbootstrap",
    version,
    about = "Generates DXL integration projects from templates"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a project from a template
    Generate {
        /// Template name (see `dxlbootstrap templates`)
        template: String,
        /// Configuration file for the template
        config_file: PathBuf,
        /// Directory to generate into
        #[arg(default_value = ".")]
        output_directory: PathBuf,
        /// Also write the generation report to this file (TOML)
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List the supported templates
    Templates,
    /// Print a starter configuration file for a template
    SampleConfig {
        template: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "parsed arguments");

    let result = match &cli.command {
        Commands::Generate {
            template,
            config_file,
            output_directory,
            report,
        } => handle_generate(template, config_file, output_directory, report.as_deref()),
        Commands::Templates => handle_templates(),
        Commands::SampleConfig { template } => handle_sample_config(template),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("Error: {err}");
            error!("Error during generation: {err:#}");
            ExitCode::FAILURE
        }
    }
}
