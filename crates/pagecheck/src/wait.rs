//! Wait Mechanisms
//!
//! Bounded polling used by locators (actionability), expectations
//! (auto-retry) and the storage convergence poller. Every wait has a fixed
//! polling interval and a hard deadline; nothing waits unbounded.

use crate::result::PagecheckResult;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for navigation (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for expectations and convergence polls (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for the actionability wait before an action (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states a navigation can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// `document.readyState` values that satisfy this load state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::Load => &["complete"],
            Self::DomContentLoaded => &["interactive", "complete"],
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Outcome of one sample in a polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sampled<T, O> {
    /// Condition holds, stop polling with this value
    Done(T),
    /// Condition does not hold yet; carries what was observed
    Pending(O),
}

/// The deadline passed before any sample returned [`Sampled::Done`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired<O> {
    /// Observation from the final sample
    pub last: O,
    /// Number of samples taken
    pub attempts: u32,
    /// Time spent polling
    pub elapsed: Duration,
}

/// Successful poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<T> {
    /// Value produced by the satisfying sample
    pub value: T,
    /// Number of samples taken, including the satisfying one
    pub attempts: u32,
    /// Time spent polling
    pub elapsed: Duration,
}

/// Run `sample` every `poll_interval` until it reports [`Sampled::Done`] or
/// the timeout passes.
///
/// The sampler always runs at least once, even with a zero timeout, and once
/// more at the deadline. Errors from the sampler abort the loop immediately.
pub async fn poll_until<T, O, F, Fut>(
    options: &WaitOptions,
    mut sample: F,
) -> PagecheckResult<Result<Polled<T>, Expired<O>>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PagecheckResult<Sampled<T, O>>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let observed = match sample().await? {
            Sampled::Done(value) => {
                return Ok(Ok(Polled {
                    value,
                    attempts,
                    elapsed: start.elapsed(),
                }));
            }
            Sampled::Pending(observed) => observed,
        };

        let now = Instant::now();
        if now >= deadline {
            return Ok(Err(Expired {
                last: observed,
                attempts,
                elapsed: start.elapsed(),
            }));
        }

        let remaining = deadline - now;
        tokio::time::sleep(options.poll_interval().min(remaining)).await;
    }
}
