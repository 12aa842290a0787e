//! CLI command definitions using clap

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pagecheck: inspect run configuration and the persisted state of live pages
#[derive(Parser, Debug)]
#[command(name = "pagecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Run config file (default: ./pagecheck.yaml when present)
    #[arg(short, long, global = true, env = "PAGECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved run configuration
    Config(ConfigArgs),

    /// Print the persisted record set of a live page
    Records(RecordsArgs),

    /// Poll a live page's persisted record set until a predicate holds
    Converge(ConvergeArgs),

    /// Capture a screenshot and compare it with its baseline
    Screenshot(ScreenshotArgs),
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Serialization of the printed config
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML, as read from pagecheck.yaml
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Arguments for the records command
#[derive(Parser, Debug)]
pub struct RecordsArgs {
    /// Page to open
    pub url: String,

    /// localStorage key holding the record list
    #[arg(short, long, default_value = pagecheck::STORAGE_KEY)]
    pub key: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputArg,
}

/// Arguments for the converge command
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("predicate")
        .required(true)
        .args(["count", "completed", "contains"])
))]
pub struct ConvergeArgs {
    /// Page to open
    pub url: String,

    /// Wait until the record count equals N
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,

    /// Wait until the completed count equals N
    #[arg(long, value_name = "N")]
    pub completed: Option<usize>,

    /// Wait until a record with this exact title exists
    #[arg(long, value_name = "TITLE")]
    pub contains: Option<String>,

    /// localStorage key holding the record list
    #[arg(short, long, default_value = pagecheck::STORAGE_KEY)]
    pub key: String,

    /// Poll timeout (default: expect_timeout_ms from the run config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the screenshot command
#[derive(Parser, Debug)]
pub struct ScreenshotArgs {
    /// Page to open
    pub url: String,

    /// Baseline name
    #[arg(short, long)]
    pub name: String,

    /// Overwrite the baseline with the new capture
    #[arg(long)]
    pub update: bool,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_config_command() {
            let cli = Cli::parse_from(["pagecheck", "config", "--format", "json"]);
            let Commands::Config(args) = cli.command else {
                panic!("expected config");
            };
            assert_eq!(args.format, ConfigFormat::Json);
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["pagecheck", "-vv", "--color", "never", "config"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_records_default_key() {
            let cli = Cli::parse_from(["pagecheck", "records", "https://demo.playwright.dev/todomvc"]);
            let Commands::Records(args) = cli.command else {
                panic!("expected records");
            };
            assert_eq!(args.key, "react-todos");
            assert_eq!(args.format, OutputArg::Text);
        }
    }

    mod converge_tests {
        use super::*;

        #[test]
        fn test_requires_a_predicate() {
            let result = Cli::try_parse_from(["pagecheck", "converge", "https://x.test"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_predicates_are_exclusive() {
            let result = Cli::try_parse_from([
                "pagecheck",
                "converge",
                "https://x.test",
                "--count",
                "3",
                "--completed",
                "1",
            ]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_contains() {
            let cli = Cli::parse_from([
                "pagecheck",
                "converge",
                "https://x.test",
                "--contains",
                "feed the cat",
                "--timeout-ms",
                "750",
            ]);
            let Commands::Converge(args) = cli.command else {
                panic!("expected converge");
            };
            assert_eq!(args.contains.as_deref(), Some("feed the cat"));
            assert_eq!(args.timeout_ms, Some(750));
        }
    }
}
