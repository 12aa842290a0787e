//! CLI configuration

use pagecheck::RunConfig;
use serde::{Deserialize, Serialize};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Level from `-v` count and `-q`
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default `tracing` filter for this level
    #[must_use]
    pub const fn log_level(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Resolved run configuration
    pub run: RunConfig,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set the run configuration
    #[must_use]
    pub fn with_run(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(0, true), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(3, true), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(4, false), Verbosity::Debug);
        }

        #[test]
        fn test_log_levels() {
            assert_eq!(Verbosity::Quiet.log_level(), "error");
            assert_eq!(Verbosity::Normal.log_level(), "warn");
            assert_eq!(Verbosity::Debug.log_level(), "debug");
            assert!(Verbosity::Debug.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Verbose)
                .with_color(ColorChoice::Never)
                .with_run(RunConfig::default().with_retries(1));
            assert_eq!(config.verbosity, Verbosity::Verbose);
            assert_eq!(config.color, ColorChoice::Never);
            assert_eq!(config.run.retries(), 1);
        }
    }
}
