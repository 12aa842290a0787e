//! Config command handler

use crate::commands::{ConfigArgs, ConfigFormat};
use crate::config::CliConfig;
use crate::error::CliResult;
use pagecheck::RunConfig;

/// Execute the config command
pub fn execute_config(config: &CliConfig, args: &ConfigArgs) -> CliResult<()> {
    print!("{}", render_config(&config.run, args.format)?);
    Ok(())
}

/// Serialize the resolved run config
pub fn render_config(run: &RunConfig, format: ConfigFormat) -> CliResult<String> {
    Ok(match format {
        ConfigFormat::Yaml => run.to_yaml()?,
        ConfigFormat::Json => {
            let mut json = serde_json::to_string_pretty(run)?;
            json.push('\n');
            json
        }
    })
}
