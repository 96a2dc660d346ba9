//! Vibe CLI - command-line access to Vibe collections and admin resources
//!
//! This is the main entry point for the `vibe` binary. It wires argument
//! parsing, configuration, logging and output around `vibe-core`.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::{OutputWriter, TableLimits};
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    let result = match load_config(&cli) {
        Ok(config) => {
            if let Err(e) = init_logging(&cli, &config) {
                eprintln!("Failed to initialize logging: {}", e);
            }
            run(cli, config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load_with_file(cli.config.as_deref())
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet, cli.verbosity_level());
    let limits = TableLimits::from(&config.output);
    let client = || handlers::build_client(&cli.connection, &config);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::List(args) => handlers::handle_list(args, &client()?, limits, &mut output).await,
        Commands::Get(args) => handlers::handle_get(args, &client()?, limits, &mut output).await,
        Commands::Create(args) => handlers::handle_create(args, &client()?, limits, &mut output).await,
        Commands::Update(args) => handlers::handle_update(args, &client()?, limits, &mut output).await,
        Commands::Delete(args) => handlers::handle_delete(args, &client()?, &mut output).await,
        Commands::Admin(args) => handlers::handle_admin(args, &client()?, limits, &mut output).await,
        Commands::Config(args) => {
            handlers::handle_config(
                args,
                &cli.connection,
                &config,
                cli.config.as_deref(),
                &mut output,
            )
            .await
        }
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
///
/// Later sources win: the config file, then `-v` flags, then `RUST_LOG` and
/// `VIBE_LOG_FORMAT`. `--debug` always surfaces client request logs.
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_sources(cli.verbosity_level(), &config.logging);
    logging_config.merge_with_env();

    let debug = cli.connection.debug || config.connection.debug.unwrap_or(false);
    if debug {
        logging_config = logging_config.with_request_logging();
    }

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
