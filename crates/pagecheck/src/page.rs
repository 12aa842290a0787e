//! Page sessions.
//!
//! A [`Page`] is a cheap, cloneable handle to one browser tab living in its
//! own browser context. It carries the session-wide timeouts and, when the
//! harness enables it, a step tracer. Locators, page objects and pollers
//! all hold clones of the same handle.

use crate::driver::{Action, Actionability, Driver, ElementState};
use crate::locator::{Locator, Role, Selector, TextMatch};
use crate::result::{PagecheckError, PagecheckResult};
use crate::tracing_support::StepTracer;
use crate::wait::{
    poll_until, LoadState, Sampled, WaitOptions, DEFAULT_ACTION_TIMEOUT_MS,
    DEFAULT_EXPECT_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeouts shared by every operation of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    /// Actionability wait before each action
    pub action_timeout_ms: u64,
    /// Auto-retry budget of expectations and convergence polls
    pub expect_timeout_ms: u64,
    /// Navigation budget
    pub navigation_timeout_ms: u64,
    /// Polling interval for every bounded wait
    pub poll_interval_ms: u64,
    /// Load state navigations wait for
    pub load_state: LoadState,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            expect_timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            load_state: LoadState::Load,
        }
    }
}

impl PageOptions {
    /// Wait options for the actionability wait
    #[must_use]
    pub const fn action_wait(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.action_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Wait options for expectations and polls
    #[must_use]
    pub const fn expect_wait(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.expect_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Set the action timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, ms: u64) -> Self {
        self.action_timeout_ms = ms;
        self
    }

    /// Set the expect timeout
    #[must_use]
    pub const fn with_expect_timeout(mut self, ms: u64) -> Self {
        self.expect_timeout_ms = ms;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }

    /// Set the load state
    #[must_use]
    pub const fn with_load_state(mut self, load_state: LoadState) -> Self {
        self.load_state = load_state;
        self
    }
}

/// Handle to one browser tab
#[derive(Debug, Clone)]
pub struct Page {
    driver: Arc<dyn Driver>,
    options: PageOptions,
    tracer: Option<StepTracer>,
}

impl Page {
    /// Wrap a driver session with default options
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            options: PageOptions::default(),
            tracer: None,
        }
    }

    /// Replace the session options
    #[must_use]
    pub const fn with_options(mut self, options: PageOptions) -> Self {
        self.options = options;
        self
    }

    /// Record every operation into `tracer`
    #[must_use]
    pub fn with_tracer(mut self, tracer: StepTracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Session options
    #[must_use]
    pub const fn options(&self) -> &PageOptions {
        &self.options
    }

    /// Attached tracer
    #[must_use]
    pub const fn tracer(&self) -> Option<&StepTracer> {
        self.tracer.as_ref()
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Run `op` inside a trace span when tracing is on
    pub async fn traced<T, Fut>(
        &self,
        name: &str,
        target: impl Into<String>,
        op: Fut,
    ) -> PagecheckResult<T>
    where
        Fut: Future<Output = PagecheckResult<T>>,
    {
        let Some(tracer) = &self.tracer else {
            return op.await;
        };
        let span = tracer.start_span(name, &target.into());
        let result = op.await;
        let message = result.as_ref().err().map(ToString::to_string);
        tracer.end_span(&span, message.as_deref());
        result
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Load `url` and wait for the configured load state
    pub async fn goto(&self, url: &str) -> PagecheckResult<()> {
        self.traced("goto", url, async {
            debug!(url, load_state = %self.options.load_state, "navigating");
            self.bounded_navigation(url, self.driver.goto(url, self.options.load_state))
                .await
        })
        .await
    }

    /// Reload the current document
    pub async fn reload(&self) -> PagecheckResult<()> {
        let url = self.driver.url().await?;
        self.traced("reload", url.clone(), async {
            debug!(url = %url, "reloading");
            self.bounded_navigation(&url, self.driver.reload(self.options.load_state))
                .await
        })
        .await
    }

    /// Go back one history entry
    pub async fn go_back(&self) -> PagecheckResult<()> {
        let url = self.driver.url().await?;
        self.traced("go_back", url.clone(), async {
            debug!(from = %url, "going back");
            self.bounded_navigation(&url, self.driver.go_back()).await
        })
        .await
    }

    async fn bounded_navigation(
        &self,
        url: &str,
        nav: impl Future<Output = PagecheckResult<()>>,
    ) -> PagecheckResult<()> {
        let budget = Duration::from_millis(self.options.navigation_timeout_ms);
        match tokio::time::timeout(budget, nav).await {
            Ok(result) => result,
            Err(_) => {
                warn!(url, timeout_ms = self.options.navigation_timeout_ms, "navigation timed out");
                Err(PagecheckError::navigation(
                    url,
                    format!(
                        "timed out after {}ms waiting for '{}'",
                        self.options.navigation_timeout_ms, self.options.load_state
                    ),
                ))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Document state
    // -------------------------------------------------------------------------

    /// Current URL
    pub async fn url(&self) -> PagecheckResult<String> {
        self.driver.url().await
    }

    /// Document title
    pub async fn title(&self) -> PagecheckResult<String> {
        self.driver.title().await
    }

    /// Press a key on the focused element
    pub async fn press_key(&self, key: &str) -> PagecheckResult<()> {
        self.traced("keyboard.press", key, async {
            debug!(key, "pressing key");
            self.driver.press_key(key).await
        })
        .await
    }

    /// Evaluate a JavaScript expression
    pub async fn evaluate(&self, script: &str) -> PagecheckResult<serde_json::Value> {
        self.driver.evaluate(script).await
    }

    /// Raw `localStorage` value for `key`
    pub async fn local_storage(&self, key: &str) -> PagecheckResult<Option<String>> {
        self.driver.local_storage(key).await
    }

    /// Viewport capture as PNG
    pub async fn screenshot(&self) -> PagecheckResult<Vec<u8>> {
        self.traced("screenshot", "viewport", self.driver.screenshot())
            .await
    }

    /// Close the session
    pub async fn close(&self) -> PagecheckResult<()> {
        debug!("closing page");
        self.driver.close().await
    }

    // -------------------------------------------------------------------------
    // Locators
    // -------------------------------------------------------------------------

    /// Bind an arbitrary selector
    #[must_use]
    pub fn locate(&self, selector: Selector) -> Locator {
        Locator::new(self.clone(), selector)
    }

    /// By ARIA role
    #[must_use]
    pub fn get_by_role(&self, role: Role) -> Locator {
        self.locate(Selector::role(role))
    }

    /// By ARIA role and accessible name
    #[must_use]
    pub fn get_by_role_named(&self, role: Role, name: impl Into<TextMatch>) -> Locator {
        self.locate(Selector::role_named(role, name))
    }

    /// By label or `aria-label`
    #[must_use]
    pub fn get_by_label(&self, text: impl Into<TextMatch>) -> Locator {
        self.locate(Selector::label(text))
    }

    /// By placeholder
    #[must_use]
    pub fn get_by_placeholder(&self, text: impl Into<TextMatch>) -> Locator {
        self.locate(Selector::placeholder(text))
    }

    /// By text content
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<TextMatch>) -> Locator {
        self.locate(Selector::text(text))
    }

    /// By `data-testid`
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Locator {
        self.locate(Selector::test_id(id))
    }

    /// By CSS
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Locator {
        self.locate(Selector::css(css))
    }

    // -------------------------------------------------------------------------
    // Locator plumbing
    // -------------------------------------------------------------------------

    /// Resolve without waiting
    pub(crate) async fn query(&self, selector: &Selector) -> PagecheckResult<Vec<ElementState>> {
        self.driver.query(selector).await
    }

    /// Wait for `selector` to be actionable, then dispatch `action`.
    ///
    /// Missing, hidden and disabled targets are retried until the action
    /// timeout; a multi-element match fails at once.
    pub(crate) async fn perform(&self, selector: &Selector, action: Action) -> PagecheckResult<()> {
        let wait = self.options.action_wait();
        let driver = &self.driver;
        let action = &action;

        self.traced(action.name(), selector.to_string(), async move {
            debug!(locator = %selector, action = %action, "performing action");
            let outcome = poll_until(&wait, move || async move {
                Ok(match driver.perform(selector, action).await? {
                    Actionability::Ready => Sampled::Done(()),
                    Actionability::Ambiguous(count) => {
                        return Err(PagecheckError::StrictModeViolation {
                            action: action.to_string(),
                            locator: selector.to_string(),
                            count,
                        })
                    }
                    blocked => Sampled::Pending(blocked),
                })
            })
            .await?;

            outcome.map(|_| ()).map_err(|expired| {
                warn!(locator = %selector, action = %action, last = %expired.last, "action timed out");
                PagecheckError::LocatorNotFound {
                    action: action.to_string(),
                    locator: selector.to_string(),
                    timeout_ms: wait.timeout_ms,
                    last_observed: expired.last.to_string(),
                }
            })
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{DocsSiteApp, MockDriver, TodoMvcApp};
    use crate::pages::{DOCS_URL, TODOMVC_URL};

    fn docs_page() -> Page {
        Page::new(Arc::new(MockDriver::new(DocsSiteApp::new())))
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = PageOptions::default();
            assert_eq!(options.action_wait().timeout_ms, DEFAULT_ACTION_TIMEOUT_MS);
            assert_eq!(options.expect_wait().timeout_ms, DEFAULT_EXPECT_TIMEOUT_MS);
            assert_eq!(options.load_state, LoadState::Load);
        }

        #[test]
        fn test_builders() {
            let options = PageOptions::default()
                .with_action_timeout(10)
                .with_expect_timeout(20)
                .with_navigation_timeout(30)
                .with_load_state(LoadState::DomContentLoaded);
            assert_eq!(options.action_timeout_ms, 10);
            assert_eq!(options.expect_timeout_ms, 20);
            assert_eq!(options.navigation_timeout_ms, 30);
            assert_eq!(options.load_state, LoadState::DomContentLoaded);
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_goto_sets_url_and_title() {
            let page = docs_page();
            page.goto(DOCS_URL).await.unwrap();
            assert_eq!(page.url().await.unwrap(), "https://playwright.dev/");
            assert!(page.title().await.unwrap().contains("Playwright"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unknown_host_is_navigation_error() {
            let page = docs_page();
            let err = page.goto("https://unreachable.invalid").await.unwrap_err();
            assert!(matches!(err, PagecheckError::Navigation { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_slow_load_times_out() {
            let driver = MockDriver::new(TodoMvcApp::new()).with_load_delay_ms(5_000);
            let page = Page::new(Arc::new(driver))
                .with_options(PageOptions::default().with_navigation_timeout(1_000));
            let err = page.goto(TODOMVC_URL).await.unwrap_err();
            match err {
                PagecheckError::Navigation { url, message } => {
                    assert_eq!(url, TODOMVC_URL);
                    assert!(message.contains("1000ms"));
                }
                other => panic!("unexpected {other}"),
            }
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_missing_element_times_out_with_reason() {
            let page = docs_page().with_options(PageOptions::default().with_action_timeout(300));
            page.goto(DOCS_URL).await.unwrap();
            let err = page.get_by_label("No such control").click().await.unwrap_err();
            match err {
                PagecheckError::LocatorNotFound {
                    action,
                    locator,
                    timeout_ms,
                    last_observed,
                } => {
                    assert_eq!(action, "click");
                    assert!(locator.contains("No such control"));
                    assert_eq!(timeout_ms, 300);
                    assert_eq!(last_observed, "no element matched");
                }
                other => panic!("unexpected {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_input_absent_until_opened() {
            let page = docs_page().with_options(PageOptions::default().with_action_timeout(200));
            page.goto(DOCS_URL).await.unwrap();
            let err = page
                .get_by_placeholder("Search docs")
                .fill("locator")
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test(start_paused = true)]
        async fn test_strict_mode_violation_fails_fast() {
            let driver = MockDriver::new(TodoMvcApp::new());
            let page = Page::new(Arc::new(driver));
            page.goto(TODOMVC_URL).await.unwrap();
            let input = page.get_by_placeholder("What needs to be done?");
            for title in ["a", "b"] {
                input.fill(title).await.unwrap();
                input.press("Enter").await.unwrap();
            }
            let started = tokio::time::Instant::now();
            let err = page.get_by_test_id("todo-item").click().await.unwrap_err();
            assert!(matches!(err, PagecheckError::StrictModeViolation { count: 2, .. }));
            assert!(started.elapsed() < Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS));
        }

        #[tokio::test(start_paused = true)]
        async fn test_tracer_records_actions() {
            let tracer = StepTracer::new("traced", 0);
            let page = docs_page().with_tracer(tracer.clone());
            page.goto(DOCS_URL).await.unwrap();
            page.get_by_label("Search").click().await.unwrap();
            let archive = tracer.finish();
            let names: Vec<_> = archive.spans.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["goto", "click"]);
            assert!(archive.spans[1].target.contains("Search"));
        }
    }
}
