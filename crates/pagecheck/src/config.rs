//! Run configuration.
//!
//! Loaded from YAML (default `pagecheck.yaml`) with every field optional,
//! then overridden from the environment:
//!
//! | variable | effect |
//! |---|---|
//! | `CI` (any non-empty value) | unset `retries` resolves to 2 instead of 0 |
//! | `CHROMIUM_PATH` | `browser.chromium_path` |
//! | `PAGECHECK_UPDATE_SNAPSHOTS` | `update_snapshots` (`none`, `missing`, `all`) |

use crate::browser::{BrowserConfig, EmulationConfig};
use crate::page::PageOptions;
use crate::result::{PagecheckError, PagecheckResult};
use crate::snapshot::{SnapshotConfig, UpdateMode};
use crate::wait::{
    LoadState, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_EXPECT_TIMEOUT_MS,
    DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "pagecheck.yaml";

/// Default per-case timeout
pub const DEFAULT_CASE_TIMEOUT_MS: u64 = 30_000;

/// When a step trace is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TracePolicy {
    /// Never record
    Off,
    /// Record and keep every attempt
    On,
    /// Record every attempt, keep failed ones
    RetainOnFailure,
    /// Record and keep only the first retry
    #[default]
    OnFirstRetry,
}

impl TracePolicy {
    /// Whether attempt `attempt` (0 = first run) is recorded
    #[must_use]
    pub const fn records(self, attempt: u32) -> bool {
        match self {
            Self::Off => false,
            Self::On | Self::RetainOnFailure => true,
            Self::OnFirstRetry => attempt == 1,
        }
    }

    /// Whether a recorded attempt's trace is written
    #[must_use]
    pub const fn keeps(self, failed: bool) -> bool {
        match self {
            Self::Off => false,
            Self::On | Self::OnFirstRetry => true,
            Self::RetainOnFailure => failed,
        }
    }
}

/// When a screenshot is captured at the end of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotPolicy {
    /// Never
    Off,
    /// After every attempt
    On,
    /// After failed attempts
    #[default]
    OnlyOnFailure,
}

impl ScreenshotPolicy {
    /// Whether an attempt with this outcome is captured
    #[must_use]
    pub const fn captures(self, failed: bool) -> bool {
        match self {
            Self::Off => false,
            Self::On => true,
            Self::OnlyOnFailure => failed,
        }
    }
}

/// Resolved configuration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Extra attempts after a failed case; unset until given or resolved
    /// from the environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Per-case timeout
    pub timeout_ms: u64,
    /// Expectation and convergence timeout
    pub expect_timeout_ms: u64,
    /// Actionability timeout
    pub action_timeout_ms: u64,
    /// Navigation timeout
    pub navigation_timeout_ms: u64,
    /// Retry interval of every bounded wait
    pub poll_interval_ms: u64,
    /// Load state navigation waits for
    pub load_state: LoadState,
    /// Browser launch options
    pub browser: BrowserConfig,
    /// Locale and timezone
    pub emulation: EmulationConfig,
    /// Step trace policy
    pub trace: TracePolicy,
    /// Failure screenshot policy
    pub screenshot: ScreenshotPolicy,
    /// Artifact directory
    pub output_dir: PathBuf,
    /// Baseline directory
    pub snapshot_dir: PathBuf,
    /// Baseline update policy
    pub update_snapshots: UpdateMode,
    /// Project name used in baseline file names
    pub project: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            retries: None,
            timeout_ms: DEFAULT_CASE_TIMEOUT_MS,
            expect_timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            load_state: LoadState::Load,
            browser: BrowserConfig::default(),
            emulation: EmulationConfig::default(),
            trace: TracePolicy::OnFirstRetry,
            screenshot: ScreenshotPolicy::OnlyOnFailure,
            output_dir: PathBuf::from("test-results"),
            snapshot_dir: PathBuf::from("__screenshots__"),
            update_snapshots: UpdateMode::Missing,
            project: String::from("chromium"),
        }
    }
}

impl RunConfig {
    /// Parse YAML
    pub fn from_yaml(yaml: &str) -> PagecheckResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file
    pub fn load(path: &Path) -> PagecheckResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            PagecheckError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loading run config");
        Self::from_yaml(&yaml)
    }

    /// Defaults, or `path` when given, or [`DEFAULT_CONFIG_FILE`] when it
    /// exists; environment overrides applied last
    pub fn discover(path: Option<&Path>) -> PagecheckResult<Self> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        base.with_env_from(|name| std::env::var(name).ok())
    }

    /// Defaults with environment overrides
    pub fn from_env() -> PagecheckResult<Self> {
        Self::default().with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `var`
    pub fn with_env_from(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> PagecheckResult<Self> {
        if self.retries.is_none() {
            let ci = var("CI").is_some_and(|v| !v.is_empty());
            self.retries = Some(if ci { 2 } else { 0 });
        }
        if let Some(path) = var("CHROMIUM_PATH").filter(|p| !p.is_empty()) {
            self.browser.chromium_path = Some(path);
        }
        if let Some(mode) = var("PAGECHECK_UPDATE_SNAPSHOTS") {
            self.update_snapshots = mode.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> PagecheckResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(PagecheckError::config("poll_interval_ms must be positive"));
        }
        for (name, value) in [
            ("timeout_ms", self.timeout_ms),
            ("expect_timeout_ms", self.expect_timeout_ms),
            ("action_timeout_ms", self.action_timeout_ms),
            ("navigation_timeout_ms", self.navigation_timeout_ms),
        ] {
            if value < self.poll_interval_ms {
                return Err(PagecheckError::config(format!(
                    "{name} ({value}ms) is shorter than poll_interval_ms ({}ms)",
                    self.poll_interval_ms
                )));
            }
        }
        if self.project.trim().is_empty() {
            return Err(PagecheckError::config("project must not be empty"));
        }
        Ok(())
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> PagecheckResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Timeouts handed to every page session
    #[must_use]
    pub const fn page_options(&self) -> PageOptions {
        PageOptions {
            action_timeout_ms: self.action_timeout_ms,
            expect_timeout_ms: self.expect_timeout_ms,
            navigation_timeout_ms: self.navigation_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            load_state: self.load_state,
        }
    }

    /// Screenshot baseline settings
    #[must_use]
    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig::default()
            .with_dir(self.snapshot_dir.clone())
            .with_output_dir(self.output_dir.clone())
            .with_project(self.project.clone())
            .with_update(self.update_snapshots)
    }

    /// Extra attempts after a failed case, 0 when unset
    #[must_use]
    pub const fn retries(&self) -> u32 {
        match self.retries {
            Some(retries) => retries,
            None => 0,
        }
    }

    /// Set retries
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Set the per-case timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the expect timeout
    #[must_use]
    pub const fn with_expect_timeout(mut self, timeout_ms: u64) -> Self {
        self.expect_timeout_ms = timeout_ms;
        self
    }

    /// Set the action timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, timeout_ms: u64) -> Self {
        self.action_timeout_ms = timeout_ms;
        self
    }

    /// Set the trace policy
    #[must_use]
    pub const fn with_trace(mut self, trace: TracePolicy) -> Self {
        self.trace = trace;
        self
    }

    /// Set the screenshot policy
    #[must_use]
    pub const fn with_screenshot(mut self, screenshot: ScreenshotPolicy) -> Self {
        self.screenshot = screenshot;
        self
    }

    /// Set the artifact directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the baseline directory
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Set the baseline update policy
    #[must_use]
    pub const fn with_update_snapshots(mut self, update: UpdateMode) -> Self {
        self.update_snapshots = update;
        self
    }

    /// Set the browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_trace_on_first_retry() {
            let policy = TracePolicy::default();
            assert!(!policy.records(0));
            assert!(policy.records(1));
            assert!(!policy.records(2));
            assert!(policy.keeps(true));
            assert!(policy.keeps(false));
        }

        #[test]
        fn test_retain_on_failure() {
            assert!(TracePolicy::RetainOnFailure.records(0));
            assert!(!TracePolicy::RetainOnFailure.keeps(false));
            assert!(TracePolicy::On.keeps(false));
            assert!(!TracePolicy::Off.records(0));
        }

        #[test]
        fn test_screenshot_policy() {
            assert!(ScreenshotPolicy::default().captures(true));
            assert!(!ScreenshotPolicy::default().captures(false));
            assert!(ScreenshotPolicy::On.captures(false));
            assert!(!ScreenshotPolicy::Off.captures(true));
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = RunConfig::default();
            assert_eq!(config.retries, None);
            assert_eq!(config.retries(), 0);
            assert_eq!(config.timeout_ms, 30_000);
            assert_eq!(config.expect_timeout_ms, 5_000);
            assert_eq!(config.trace, TracePolicy::OnFirstRetry);
            assert_eq!(config.screenshot, ScreenshotPolicy::OnlyOnFailure);
            assert_eq!(config.project, "chromium");
            config.validate().unwrap();
        }

        #[test]
        fn test_partial_yaml() {
            let config = RunConfig::from_yaml(
                "retries: 1\ntrace: retain-on-failure\nbrowser:\n  headless: false\nemulation:\n  locale: fr-FR\n",
            )
            .unwrap();
            assert_eq!(config.retries(), 1);
            assert_eq!(config.trace, TracePolicy::RetainOnFailure);
            assert!(!config.browser.headless);
            assert_eq!(config.emulation.locale, "fr-FR");
            assert_eq!(config.emulation.timezone_id, "Europe/Paris");
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = RunConfig::default().with_retries(3);
            let back = RunConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
            assert_eq!(back, config);
        }

        #[test]
        fn test_unknown_policy_rejected() {
            let err = RunConfig::from_yaml("screenshot: sometimes\n").unwrap_err();
            assert!(matches!(err, PagecheckError::Yaml(_)));
        }

        #[test]
        fn test_validate_poll_interval() {
            let err = RunConfig::from_yaml("poll_interval_ms: 0\n").unwrap_err();
            assert!(err.to_string().contains("poll_interval_ms"));
            let err = RunConfig::from_yaml("expect_timeout_ms: 10\n").unwrap_err();
            assert!(err.to_string().contains("expect_timeout_ms"));
        }

        #[test]
        fn test_load_file() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("pagecheck.yaml");
            std::fs::write(&path, "project: firefox\n").unwrap();
            assert_eq!(RunConfig::load(&path).unwrap().project, "firefox");
            assert!(RunConfig::load(&dir.path().join("missing.yaml")).is_err());
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_ci_enables_retries() {
            let config = RunConfig::default().with_env_from(env(&[("CI", "true")])).unwrap();
            assert_eq!(config.retries(), 2);
            let config = RunConfig::default()
                .with_retries(1)
                .with_env_from(env(&[("CI", "1")]))
                .unwrap();
            assert_eq!(config.retries(), 1);
        }

        #[test]
        fn test_any_non_empty_ci_is_truthy() {
            for value in ["false", "0", "yes"] {
                let config = RunConfig::default()
                    .with_env_from(env(&[("CI", value)]))
                    .unwrap();
                assert_eq!(config.retries(), 2, "CI={value}");
            }
            let config = RunConfig::default().with_env_from(env(&[("CI", "")])).unwrap();
            assert_eq!(config.retries, Some(0));
            let config = RunConfig::default().with_env_from(env(&[])).unwrap();
            assert_eq!(config.retries, Some(0));
        }

        #[test]
        fn test_explicit_zero_retries_survive_ci() {
            let config = RunConfig::from_yaml("retries: 0
")
                .unwrap()
                .with_env_from(env(&[("CI", "true")]))
                .unwrap();
            assert_eq!(config.retries(), 0);
            let config = RunConfig::from_yaml("project: nightly
")
                .unwrap()
                .with_env_from(env(&[("CI", "true")]))
                .unwrap();
            assert_eq!(config.retries(), 2);
        }

        #[test]
        fn test_chromium_path_and_update_mode() {
            let config = RunConfig::default()
                .with_env_from(env(&[
                    ("CHROMIUM_PATH", "/opt/chromium"),
                    ("PAGECHECK_UPDATE_SNAPSHOTS", "all"),
                ]))
                .unwrap();
            assert_eq!(config.browser.chromium_path.as_deref(), Some("/opt/chromium"));
            assert_eq!(config.update_snapshots, UpdateMode::All);
        }

        #[test]
        fn test_bad_update_mode() {
            let err = RunConfig::default()
                .with_env_from(env(&[("PAGECHECK_UPDATE_SNAPSHOTS", "maybe")]))
                .unwrap_err();
            assert!(matches!(err, PagecheckError::Config { .. }));
        }

        #[test]
        fn test_page_options_follow_config() {
            let options = RunConfig::default().with_action_timeout(700).page_options();
            assert_eq!(options.action_timeout_ms, 700);
            assert_eq!(options.expect_timeout_ms, 5_000);
        }
    }
}
