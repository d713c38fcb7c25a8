//! # trpc-studio entry point
//!
//! Parses command-line arguments, layers them over the configuration
//! file, initializes logging and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use studio_cli::config::{load_file, ConfigArgs, PartialConfig, CONFIG_FILE_NAMES};
use studio_cli::inspect::{run_inspect, InspectArgs};
use studio_cli::logging;
use studio_cli::serve::run_serve;

/// tRPC Studio
///
/// Provides a simple web API to list, inspect and test tRPC procedures
/// without implementing a client.
#[derive(Parser, Debug)]
#[command(name = "trpc-studio", version, about, long_about = None, after_help = config_help())]
struct Cli {
    #[command(flatten)]
    options: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the procedure catalog and relay executions (default).
    Serve,

    /// Print the discovered procedure catalog as JSON.
    Inspect(InspectArgs),
}

fn config_help() -> String {
    format!(
        "Configuration can be provided via any of the following files:\n{}",
        CONFIG_FILE_NAMES.join("\n")
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let (file, outcome) = load_file(cli.options.config.as_deref(), &cwd);
    let merged = PartialConfig::defaults()
        .merge(file)
        .merge(cli.options.to_partial());

    logging::init(merged.log_level());
    outcome.report();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => match merged.validate(&cwd) {
            Ok(config) => {
                tracing::info!("Starting tRPC Studio");
                run_serve(&config).await
            }
            Err(e) => return invalid_configuration(e),
        },
        Commands::Inspect(args) => match merged.validate_router_path(&cwd) {
            Ok(router_path) => run_inspect(&args, &router_path).await,
            Err(e) => return invalid_configuration(e),
        },
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn invalid_configuration(error: studio_cli::config::ConfigError) -> ExitCode {
    tracing::error!("{error}");
    tracing::info!("Use --help to see the options or check the configuration file.");
    ExitCode::from(1)
}
