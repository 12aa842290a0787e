//! Pagecheck CLI Library
//!
//! Command-line access to the run configuration and to the persisted state
//! of live pages.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormat, ConvergeArgs, OutputArg, RecordsArgs,
    ScreenshotArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{format_record, render_records, Reporter};

use pagecheck::RunConfig;

/// Resolve logging, colors and the run config from parsed arguments
pub fn build_config(cli: &Cli) -> CliResult<CliConfig> {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let _ = pagecheck::logging::init_with(verbosity.log_level(), pagecheck::logging::LogFormat::Compact);
    let run = RunConfig::discover(cli.config.as_deref())?;
    Ok(CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(cli.color.clone().into())
        .with_run(run))
}

/// Run one parsed command line to completion
pub async fn execute(cli: Cli) -> CliResult<()> {
    let config = build_config(&cli)?;
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());

    match &cli.command {
        Commands::Config(args) => handlers::execute_config(&config, args),
        Commands::Records(args) => handlers::execute_records(&config, args, &reporter).await,
        Commands::Converge(args) => handlers::execute_converge(&config, args, &reporter).await,
        Commands::Screenshot(args) => {
            handlers::execute_screenshot(&config, args, &reporter).await
        }
    }
}
