//! Screenshot baselines.
//!
//! Baselines live at `<snapshot_dir>/<name>-<project>-<platform>.png`.
//! Comparison is by SHA-256 digest of the PNG bytes; there is no pixel
//! diffing, so baselines are only portable between identical renderers.

use crate::result::{PagecheckError, PagecheckResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// When baselines are (re)written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    /// Never write; a missing baseline is an error
    None,
    /// Write baselines that do not exist yet
    #[default]
    Missing,
    /// Overwrite every baseline
    All,
}

impl std::str::FromStr for UpdateMode {
    type Err = PagecheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "0" | "false" => Ok(Self::None),
            "missing" => Ok(Self::Missing),
            "all" | "1" | "true" => Ok(Self::All),
            other => Err(PagecheckError::config(format!(
                "unknown snapshot update mode '{other}' (expected none, missing or all)"
            ))),
        }
    }
}

/// Configuration for screenshot baselines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Directory holding baselines
    pub snapshot_dir: PathBuf,
    /// Directory receiving actual captures on mismatch
    pub output_dir: PathBuf,
    /// Project name baked into file names
    pub project: String,
    /// Update policy
    pub update: UpdateMode,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("__screenshots__"),
            output_dir: PathBuf::from("test-results"),
            project: String::from("chromium"),
            update: UpdateMode::Missing,
        }
    }
}

impl SnapshotConfig {
    /// Set update mode
    #[must_use]
    pub const fn with_update(mut self, update: UpdateMode) -> Self {
        self.update = update;
        self
    }

    /// Set snapshot directory
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Set output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set project name
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }
}

/// Outcome of comparing a capture against its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotCheck {
    /// Digests equal
    Matched,
    /// No baseline existed; the capture was written as the baseline
    Created,
    /// Baseline overwritten (update mode `all`)
    Updated,
    /// Digests differ
    Mismatch,
}

/// Lowercase hex SHA-256 of `bytes`
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Platform suffix used in baseline names
#[must_use]
pub fn platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Baseline store for one project
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    config: SnapshotConfig,
}

impl ScreenshotStore {
    /// Create a store
    #[must_use]
    pub const fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    /// Store configuration
    #[must_use]
    pub const fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    fn stem(name: &str) -> &str {
        name.strip_suffix(".png").unwrap_or(name)
    }

    /// Baseline path for `name`
    #[must_use]
    pub fn baseline_path(&self, name: &str) -> PathBuf {
        self.config.snapshot_dir.join(format!(
            "{}-{}-{}.png",
            Self::stem(name),
            self.config.project,
            platform()
        ))
    }

    /// Path an actual capture is written to on mismatch
    #[must_use]
    pub fn actual_path(&self, name: &str) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}-actual.png", Self::stem(name)))
    }

    fn write(path: &Path, bytes: &[u8]) -> PagecheckResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Compare `actual` against the baseline, writing it where the update
    /// mode allows
    pub fn check(&self, name: &str, actual: &[u8]) -> PagecheckResult<SnapshotCheck> {
        let path = self.baseline_path(name);

        if self.config.update == UpdateMode::All {
            Self::write(&path, actual)?;
            info!(baseline = %path.display(), "screenshot baseline updated");
            return Ok(SnapshotCheck::Updated);
        }

        if !path.exists() {
            if self.config.update == UpdateMode::Missing {
                Self::write(&path, actual)?;
                info!(baseline = %path.display(), "screenshot baseline written");
                return Ok(SnapshotCheck::Created);
            }
            return Err(PagecheckError::SnapshotMissing {
                path: path.display().to_string(),
            });
        }

        let expected = fs::read(&path)?;
        let (want, got) = (digest(&expected), digest(actual));
        debug!(baseline = %path.display(), %want, %got, "comparing screenshot");
        Ok(if want == got {
            SnapshotCheck::Matched
        } else {
            SnapshotCheck::Mismatch
        })
    }

    /// Record a final mismatch: write the actual capture and build the error
    #[must_use]
    pub fn reject(&self, name: &str, actual: &[u8]) -> PagecheckError {
        let baseline = self.baseline_path(name);
        let actual_path = self.actual_path(name);
        if let Err(e) = Self::write(&actual_path, actual) {
            warn!(path = %actual_path.display(), error = %e, "could not write actual screenshot");
        }
        PagecheckError::SnapshotMismatch {
            name: name.to_string(),
            baseline: baseline.display().to_string(),
            actual: actual_path.display().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir, update: UpdateMode) -> ScreenshotStore {
        ScreenshotStore::new(
            SnapshotConfig::default()
                .with_dir(dir.path().join("shots"))
                .with_output_dir(dir.path().join("out"))
                .with_update(update),
        )
    }

    mod naming_tests {
        use super::*;

        #[test]
        fn test_baseline_name_has_project_and_platform() {
            let store = ScreenshotStore::new(SnapshotConfig::default());
            let path = store.baseline_path("playwright-home.png");
            let file = path.file_name().unwrap().to_str().unwrap();
            assert_eq!(file, format!("playwright-home-chromium-{}.png", platform()));
            assert!(path.starts_with("__screenshots__"));
        }

        #[test]
        fn test_digest_is_hex_sha256() {
            assert_eq!(
                digest(b""),
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            );
        }

        #[test]
        fn test_update_mode_parse() {
            assert_eq!("missing".parse::<UpdateMode>().unwrap(), UpdateMode::Missing);
            assert_eq!("ALL".parse::<UpdateMode>().unwrap(), UpdateMode::All);
            assert_eq!("0".parse::<UpdateMode>().unwrap(), UpdateMode::None);
            assert!("sometimes".parse::<UpdateMode>().is_err());
        }
    }

    mod compare_tests {
        use super::*;

        #[test]
        fn test_missing_baseline_is_created() {
            let dir = TempDir::new().unwrap();
            let store = store(&dir, UpdateMode::Missing);
            assert_eq!(store.check("home", b"png-1").unwrap(), SnapshotCheck::Created);
            assert_eq!(fs::read(store.baseline_path("home")).unwrap(), b"png-1");
            assert_eq!(store.check("home", b"png-1").unwrap(), SnapshotCheck::Matched);
        }

        #[test]
        fn test_missing_baseline_without_updates_fails() {
            let dir = TempDir::new().unwrap();
            let err = store(&dir, UpdateMode::None).check("home", b"png").unwrap_err();
            assert!(matches!(err, PagecheckError::SnapshotMissing { .. }));
        }

        #[test]
        fn test_mismatch_and_reject() {
            let dir = TempDir::new().unwrap();
            let store = store(&dir, UpdateMode::Missing);
            store.check("home", b"baseline").unwrap();
            assert_eq!(store.check("home", b"changed").unwrap(), SnapshotCheck::Mismatch);

            let err = store.reject("home", b"changed");
            assert!(matches!(err, PagecheckError::SnapshotMismatch { .. }));
            assert_eq!(fs::read(store.actual_path("home")).unwrap(), b"changed");
        }

        #[test]
        fn test_update_all_overwrites() {
            let dir = TempDir::new().unwrap();
            store(&dir, UpdateMode::Missing).check("home", b"old").unwrap();
            let updating = store(&dir, UpdateMode::All);
            assert_eq!(updating.check("home", b"new").unwrap(), SnapshotCheck::Updated);
            assert_eq!(fs::read(updating.baseline_path("home")).unwrap(), b"new");
        }
    }
}
