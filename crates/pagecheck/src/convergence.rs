//! State-convergence poller.
//!
//! The page under test persists its record set asynchronously, so a check
//! made right after an interaction can observe stale storage. The poller
//! samples the storage key on a fixed interval until a predicate holds or
//! the timeout passes.
//!
//! ```text
//!   sample ──► parse ──► predicate?
//!     ▲                    │ no (or absent / malformed)
//!     └──── sleep ◄────────┘
//! ```
//!
//! A missing key or unparsable value counts as "not yet converged", never
//! as a failure on its own.

use crate::page::Page;
use crate::records::{RecordSet, STORAGE_KEY};
use crate::result::{PagecheckError, PagecheckResult};
use crate::wait::{poll_until, Sampled, WaitOptions};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

// =============================================================================
// OBSERVATION
// =============================================================================

/// One sample of the storage key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// Key not present
    Absent,
    /// Value present but not a record list
    Malformed {
        /// Raw stored value
        raw: String,
        /// Parse error
        reason: String,
    },
    /// Parsed record list
    Parsed(RecordSet),
}

impl Observed {
    /// Classify a raw storage value
    #[must_use]
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            None => Self::Absent,
            Some(raw) => match RecordSet::parse(&raw) {
                Ok(set) => Self::Parsed(set),
                Err(e) => Self::Malformed {
                    raw,
                    reason: e.to_string(),
                },
            },
        }
    }

    /// Read and classify the current value of `key`
    pub async fn sample(page: &Page, key: &str) -> PagecheckResult<Self> {
        Ok(Self::from_raw(page.local_storage(key).await?))
    }

    /// Parsed records, if any
    #[must_use]
    pub const fn records(&self) -> Option<&RecordSet> {
        match self {
            Self::Parsed(set) => Some(set),
            _ => None,
        }
    }
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Malformed { raw, reason } => write!(f, "malformed ({reason}): {raw:?}"),
            Self::Parsed(set) => write!(f, "{set}"),
        }
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

type Check = dyn Fn(&RecordSet) -> bool + Send + Sync;

/// Described predicate over a parsed record set
#[derive(Clone)]
pub struct RecordPredicate {
    description: String,
    check: Arc<Check>,
}

impl RecordPredicate {
    /// Total record count equals `n`
    #[must_use]
    pub fn count(n: usize) -> Self {
        Self::custom(format!("record count == {n}"), move |set| set.len() == n)
    }

    /// Completed record count equals `n`
    #[must_use]
    pub fn completed_count(n: usize) -> Self {
        Self::custom(format!("completed count == {n}"), move |set| {
            set.completed_count() == n
        })
    }

    /// Some record's title equals `title`
    #[must_use]
    pub fn contains_title(title: impl Into<String>) -> Self {
        let title = title.into();
        Self::custom(format!("contains title {title:?}"), move |set| {
            set.contains_title(&title)
        })
    }

    /// Ad-hoc predicate with a description used in timeout errors
    #[must_use]
    pub fn custom(
        description: impl Into<String>,
        check: impl Fn(&RecordSet) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Evaluate against a snapshot
    #[must_use]
    pub fn holds(&self, set: &RecordSet) -> bool {
        (self.check)(set)
    }

    /// Description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for RecordPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordPredicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RecordPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

// =============================================================================
// POLLER
// =============================================================================

/// Successful convergence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    /// Snapshot that satisfied the predicate
    pub snapshot: RecordSet,
    /// Samples taken
    pub attempts: u32,
    /// Time spent polling
    pub elapsed: Duration,
}

/// Poller bound to one page and storage key
#[derive(Debug, Clone)]
pub struct ConvergencePoller {
    page: Page,
    key: String,
    wait: WaitOptions,
}

impl ConvergencePoller {
    /// Poll `react-todos` with the page's expect timeout
    #[must_use]
    pub fn new(page: Page) -> Self {
        let wait = page.options().expect_wait();
        Self {
            page,
            key: STORAGE_KEY.to_string(),
            wait,
        }
    }

    /// Poll a different storage key
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Override the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait = self.wait.with_timeout(timeout_ms);
        self
    }

    /// Override the polling interval
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.wait = self.wait.with_poll_interval(poll_interval_ms);
        self
    }

    /// Storage key being sampled
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Single sample with no waiting
    pub async fn snapshot(&self) -> PagecheckResult<Observed> {
        Observed::sample(&self.page, &self.key).await
    }

    /// Start a poll run for `predicate`
    #[must_use]
    pub fn start(&self, predicate: RecordPredicate) -> PollRun {
        PollRun {
            page: self.page.clone(),
            key: self.key.clone(),
            wait: self.wait,
            predicate,
        }
    }

    /// Poll until `predicate` holds
    pub async fn wait_for(&self, predicate: RecordPredicate) -> PagecheckResult<Convergence> {
        self.start(predicate).run().await
    }

    /// Poll until the record count equals `n`
    pub async fn wait_for_count(&self, n: usize) -> PagecheckResult<Convergence> {
        self.wait_for(RecordPredicate::count(n)).await
    }

    /// Poll until the completed count equals `n`
    pub async fn wait_for_completed(&self, n: usize) -> PagecheckResult<Convergence> {
        self.wait_for(RecordPredicate::completed_count(n)).await
    }

    /// Poll until a record titled `title` exists
    pub async fn wait_for_title(&self, title: impl Into<String>) -> PagecheckResult<Convergence> {
        self.wait_for(RecordPredicate::contains_title(title)).await
    }
}

/// A pending poll.
///
/// `run` consumes the value: a run ends either converged or timed out and
/// cannot be restarted. Start a new run from the poller instead.
#[derive(Debug)]
#[must_use = "a poll run does nothing until run() is awaited"]
pub struct PollRun {
    page: Page,
    key: String,
    wait: WaitOptions,
    predicate: RecordPredicate,
}

impl PollRun {
    /// Predicate being polled for
    pub fn predicate(&self) -> &RecordPredicate {
        &self.predicate
    }

    /// Sample until the predicate holds or the timeout passes
    pub async fn run(self) -> PagecheckResult<Convergence> {
        let target = format!("{} until {}", self.key, self.predicate);
        let page = &self.page;
        let key = self.key.as_str();
        let predicate = &self.predicate;
        let wait = &self.wait;

        page.traced("converge", target, async move {
            debug!(key, predicate = %predicate, timeout_ms = wait.timeout_ms, "convergence poll started");
            let outcome = poll_until(wait, move || async move {
                let observed = Observed::sample(page, key).await?;
                trace!(key, observed = %observed, "storage sample");
                Ok(match observed {
                    Observed::Parsed(set) if predicate.holds(&set) => Sampled::Done(set),
                    other => Sampled::Pending(other),
                })
            })
            .await?;

            match outcome {
                Ok(polled) => {
                    debug!(key, attempts = polled.attempts, "storage converged");
                    Ok(Convergence {
                        snapshot: polled.value,
                        attempts: polled.attempts,
                        elapsed: polled.elapsed,
                    })
                }
                Err(expired) => {
                    warn!(key, predicate = %predicate, last = %expired.last, "storage did not converge");
                    Err(PagecheckError::ConvergenceTimeout {
                        key: key.to_string(),
                        predicate: predicate.to_string(),
                        timeout_ms: wait.timeout_ms,
                        attempts: expired.attempts,
                        last_snapshot: expired.last,
                    })
                }
            }
        })
        .await
    }
}
