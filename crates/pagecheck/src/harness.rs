//! Case runner: retries, per-case timeout and failure artifacts.
//!
//! Every attempt gets a fresh [`PageFixture`], so an attempt never sees the
//! browser state of the one before it. Artifacts land in
//! `<output_dir>/<case-slug>/`.

use crate::config::RunConfig;
use crate::fixture::{Fixture, PageFixture, SessionFactory};
use crate::pages::PageObject;
use crate::result::{PagecheckError, PagecheckResult};
use crate::tracing_support::StepTracer;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Directory-safe form of a case name
#[must_use]
pub fn case_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "case".to_string()
    } else {
        slug.to_string()
    }
}

/// Outcome of one attempt
#[derive(Debug)]
pub struct Attempt {
    /// Attempt number, 0 for the first run
    pub index: u32,
    /// Failure, if any
    pub error: Option<PagecheckError>,
    /// Wall-clock duration
    pub duration: Duration,
    /// Step trace written for this attempt
    pub trace: Option<PathBuf>,
    /// Screenshot written for this attempt
    pub screenshot: Option<PathBuf>,
}

impl Attempt {
    /// Whether the attempt passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of running one case
#[derive(Debug)]
pub struct CaseReport {
    /// Case name
    pub name: String,
    /// Every attempt, in order
    pub attempts: Vec<Attempt>,
    /// Total duration
    pub duration: Duration,
}

impl CaseReport {
    /// Whether the last attempt passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.attempts.last().is_some_and(Attempt::passed)
    }

    /// Passed only after at least one failure
    #[must_use]
    pub fn flaky(&self) -> bool {
        self.passed() && self.attempts.len() > 1
    }

    /// Every artifact written across attempts
    #[must_use]
    pub fn artifacts(&self) -> Vec<&Path> {
        self.attempts
            .iter()
            .flat_map(|a| a.trace.iter().chain(a.screenshot.iter()))
            .map(PathBuf::as_path)
            .collect()
    }

    /// The report, or the last attempt's error
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt when it failed.
    pub fn into_result(mut self) -> PagecheckResult<Self> {
        match self.attempts.last_mut().and_then(|a| a.error.take()) {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// Runs cases against sessions from one factory
#[derive(Debug, Clone)]
pub struct Harness {
    config: RunConfig,
    factory: Arc<dyn SessionFactory>,
}

impl Harness {
    /// Create a harness
    #[must_use]
    pub fn new(config: RunConfig, factory: Arc<dyn SessionFactory>) -> Self {
        Self { config, factory }
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run `body` against a navigated `P`, failing with the last attempt's
    /// error
    pub async fn run<P, F, Fut>(&self, name: &str, body: F) -> PagecheckResult<CaseReport>
    where
        P: PageObject + Clone + 'static,
        F: Fn(P) -> Fut + Send + Sync,
        Fut: Future<Output = PagecheckResult<()>> + Send,
    {
        self.report::<P, F, Fut>(name, body).await.into_result()
    }

    /// Run `body` with retries and return every attempt
    pub async fn report<P, F, Fut>(&self, name: &str, body: F) -> CaseReport
    where
        P: PageObject + Clone + 'static,
        F: Fn(P) -> Fut + Send + Sync,
        Fut: Future<Output = PagecheckResult<()>> + Send,
    {
        let started = Instant::now();
        let dir = self.config.output_dir.join(case_slug(name));
        let mut attempts = Vec::new();

        for index in 0..=self.config.retries() {
            let attempt = self.attempt::<P, F, Fut>(name, index, &dir, &body).await;
            let passed = attempt.passed();
            if let Some(error) = &attempt.error {
                warn!(case = name, attempt = index, error = %error, "attempt failed");
            }
            attempts.push(attempt);
            if passed {
                break;
            }
        }

        let report = CaseReport {
            name: name.to_string(),
            attempts,
            duration: started.elapsed(),
        };
        info!(
            case = name,
            passed = report.passed(),
            attempts = report.attempts.len(),
            "case finished"
        );
        report
    }

    async fn attempt<P, F, Fut>(&self, name: &str, index: u32, dir: &Path, body: &F) -> Attempt
    where
        P: PageObject + Clone + 'static,
        F: Fn(P) -> Fut + Send + Sync,
        Fut: Future<Output = PagecheckResult<()>> + Send,
    {
        let started = Instant::now();
        let tracer = self
            .config
            .trace
            .records(index)
            .then(|| StepTracer::new(name, index));
        let mut fixture = PageFixture::<P>::new(Arc::clone(&self.factory), self.config.page_options())
            .with_tracer(tracer.clone());

        let budget = Duration::from_millis(self.config.timeout_ms);
        let run = async {
            fixture.setup().await?;
            let object = fixture.get()?.clone();
            body(object).await
        };
        let mut outcome = match tokio::time::timeout(budget, run).await {
            Ok(result) => result,
            Err(_) => Err(PagecheckError::CaseTimeout {
                name: name.to_string(),
                timeout_ms: self.config.timeout_ms,
            }),
        };
        let failed = outcome.is_err();

        let mut screenshot = None;
        if self.config.screenshot.captures(failed) {
            if let Some(session) = fixture.session() {
                let path = dir.join(format!("attempt-{index}.png"));
                match session.screenshot().await {
                    Ok(bytes) => match write_artifact(&path, &bytes) {
                        Ok(()) => screenshot = Some(path),
                        Err(e) => warn!(path = %path.display(), error = %e, "screenshot not written"),
                    },
                    Err(e) => warn!(case = name, error = %e, "screenshot capture failed"),
                }
            }
        }

        if let Err(e) = fixture.teardown().await {
            warn!(case = name, error = %e, "teardown failed");
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }

        let mut trace = None;
        if let Some(tracer) = tracer {
            if self.config.trace.keeps(outcome.is_err()) {
                let path = dir.join(format!("trace-attempt-{index}.json"));
                match tracer.finish().save_json(&path) {
                    Ok(()) => trace = Some(path),
                    Err(e) => warn!(path = %path.display(), error = %e, "trace not written"),
                }
            }
        }

        Attempt {
            index,
            error: outcome.err(),
            duration: started.elapsed(),
            trace,
            screenshot,
        }
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> PagecheckResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
