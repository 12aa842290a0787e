//! Harness setup shared by the integration suites.
//!
//! Scenario bodies live in [`todomvc`] and [`docs`] and take a navigated page
//! object, so the same body runs against the in-memory engine and, with the
//! `browser` feature, against Chromium.

#![allow(dead_code)]

pub mod docs;
pub mod todomvc;

use pagecheck::prelude::*;
use tempfile::TempDir;

/// Harness over mock sessions, writing artifacts into a scratch directory
pub struct Offline {
    pub harness: Harness,
    pub factory: MockSessionFactory,
    pub dir: TempDir,
}

impl Offline {
    /// Harness over fresh TodoMVC apps
    pub fn todomvc() -> Self {
        Self::new(MockSessionFactory::todomvc())
    }

    /// Harness over fresh documentation sites
    pub fn docs_site() -> Self {
        Self::new(MockSessionFactory::docs_site())
    }

    pub fn new(factory: MockSessionFactory) -> Self {
        Self::with_config(factory, RunConfig::default())
    }

    pub fn with_config(factory: MockSessionFactory, config: RunConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let config = config
            .with_output_dir(dir.path().join("test-results"))
            .with_snapshot_dir(dir.path().join("__screenshots__"));
        let harness = Harness::new(config, Arc::new(factory.clone()));
        Self {
            harness,
            factory,
            dir,
        }
    }

    /// Baselines resolved the way the harness resolves them
    pub fn store(&self) -> ScreenshotStore {
        ScreenshotStore::new(self.harness.config().snapshot_config())
    }
}

/// Run `body` in Chromium with the environment's run configuration.
#[cfg(feature = "browser")]
pub async fn live<P, F, Fut>(name: &str, body: F) -> PagecheckResult<CaseReport>
where
    P: PageObject + Clone + 'static,
    F: Fn(P) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = PagecheckResult<()>> + Send,
{
    let _ = pagecheck::logging::init();
    let config = RunConfig::from_env()?;
    let factory = Arc::new(CdpSessionFactory::launch(&config).await?);
    let harness = Harness::new(config, factory.clone());
    let result = harness.run::<P, F, Fut>(name, body).await;
    drop(harness);
    if let Ok(factory) = Arc::try_unwrap(factory) {
        factory.close().await?;
    }
    result
}

/// Live store under the environment's snapshot directory
#[cfg(feature = "browser")]
pub fn live_store() -> ScreenshotStore {
    ScreenshotStore::new(RunConfig::from_env().unwrap().snapshot_config())
}
