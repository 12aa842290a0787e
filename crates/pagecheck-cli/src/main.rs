//! Pagecheck CLI
//!
//! ## Usage
//!
//! ```bash
//! pagecheck config --format json
//! pagecheck records https://demo.playwright.dev/todomvc
//! pagecheck converge https://demo.playwright.dev/todomvc --contains "feed the cat"
//! pagecheck screenshot https://playwright.dev --name home
//! ```

use clap::Parser;
use pagecheck_cli::{Cli, CliResult};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(pagecheck_cli::execute(cli))
}
