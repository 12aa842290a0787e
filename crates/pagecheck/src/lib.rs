//! Pagecheck: page objects and persistence checks for browser end-to-end tests
//!
//! Cases drive a browser through page objects, wait on elements with
//! auto-waiting locators, assert with auto-retrying expectations, and poll
//! client-side storage until the page's asynchronous persistence settles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGECHECK Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Locator    │    │ Driver     │            │
//! │   │ Object     │───►│ (auto-     │───►│ CDP or     │            │
//! │   │ actions    │    │  wait)     │    │ in-memory  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                                    ▲                  │
//! │         ▼                                    │                  │
//! │   ┌────────────┐    ┌────────────┐           │                  │
//! │   │ expect()   │    │ Converge   │───────────┘                  │
//! │   │ (retry)    │    │ poller     │  localStorage samples        │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pagecheck::prelude::*;
//!
//! let harness = Harness::new(RunConfig::from_env()?, Arc::new(MockSessionFactory::todomvc()));
//! harness
//!     .run("adds three todos", |todo: TodoMvcPage| async move {
//!         todo.create_default_todos().await?;
//!         expect(&todo.todo_titles).to_have_texts(&DEFAULT_TODOS).await?;
//!         todo.records().wait_for_count(3).await?;
//!         Ok(())
//!     })
//!     .await?;
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod assertion;
mod browser;
#[allow(clippy::missing_errors_doc)]
mod convergence;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
mod fixture;
mod harness;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod locator;
#[allow(clippy::missing_errors_doc)]
mod page;
mod records;
mod result;
#[allow(clippy::missing_errors_doc)]
mod snapshot;
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
mod tracing_support;
#[allow(clippy::missing_errors_doc)]
mod wait;

/// Run configuration loaded from `pagecheck.yaml` and the environment
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// `tracing` subscriber setup
pub mod logging;

/// In-memory driver and simulated target applications
///
/// Lets every page object and scenario run offline and deterministically.
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
pub mod mock;

/// Page objects for the documentation site and the TodoMVC demo
#[allow(clippy::missing_errors_doc)]
pub mod pages;

pub use assertion::{expect, expect_page, LocatorExpect, PageExpect};
#[cfg(feature = "browser")]
pub use browser::{CdpBrowser, CdpDriver};
pub use browser::{key_definition, BrowserConfig, EmulationConfig, Viewport};
pub use config::{RunConfig, ScreenshotPolicy, TracePolicy};
pub use convergence::{Convergence, ConvergencePoller, Observed, PollRun, RecordPredicate};
pub use driver::{Action, Actionability, Driver, ElementState};
#[cfg(feature = "browser")]
pub use fixture::CdpSessionFactory;
pub use fixture::{Fixture, FixtureState, MockSessionFactory, PageFixture, SessionFactory};
pub use harness::{case_slug, Attempt, CaseReport, Harness};
pub use locator::{Locator, Role, Selector, SelectorStep, TextMatch};
pub use page::{Page, PageOptions};
pub use pages::{DocsHomePage, EditCommit, Filter, PageObject, TodoMvcPage};
pub use records::{RecordSet, TodoRecord, STORAGE_KEY};
pub use result::{PagecheckError, PagecheckResult};
pub use snapshot::{digest, platform, ScreenshotStore, SnapshotCheck, SnapshotConfig, UpdateMode};
pub use tracing_support::{SpanStatus, StepTracer, TraceArchive, TraceMetadata, TracedSpan};
pub use wait::{
    poll_until, Expired, LoadState, Polled, Sampled, WaitOptions, DEFAULT_ACTION_TIMEOUT_MS,
    DEFAULT_EXPECT_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::convergence::*;
    pub use super::driver::*;
    pub use super::fixture::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::mock::{DocsSiteApp, MockApp, MockDriver, TodoMvcApp};
    pub use super::page::*;
    pub use super::pages::*;
    pub use super::records::*;
    pub use super::result::*;
    pub use super::snapshot::*;
    pub use super::tracing_support::*;
    pub use super::wait::*;
    pub use std::sync::Arc;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::prelude::*;

    mod prelude_tests {
        use super::*;

        #[test]
        fn test_prelude_exposes_both_page_objects() {
            assert_eq!(<TodoMvcPage as PageObject>::URL, TODOMVC_URL);
            assert_eq!(<DocsHomePage as PageObject>::URL, DOCS_URL);
        }

        #[test]
        fn test_defaults_agree() {
            let config = RunConfig::default();
            let options = config.page_options();
            assert_eq!(options, PageOptions::default());
            assert_eq!(STORAGE_KEY, "react-todos");
        }
    }
}
