//! In-memory driver for offline, deterministic runs.
//!
//! [`MockDriver`] implements [`Driver`] over a [`MockApp`]: a small state
//! machine that renders a [`MockElement`] tree and reacts to actions the
//! way the real page does. Two apps ship with the crate:
//!
//! - [`TodoMvcApp`]: the TodoMVC demo, including hash routing and a
//!   configurable persistence lag on `localStorage`
//! - [`DocsSiteApp`]: the documentation site home page, search modal and
//!   docs link
//!
//! ## Example
//!
//! ```rust,ignore
//! use pagecheck::mock::{MockDriver, TodoMvcApp};
//!
//! let driver = MockDriver::new(TodoMvcApp::new().with_persist_lag(2));
//! let page = Page::new(Arc::new(driver));
//! let todo = TodoMvcPage::from_page(page);
//! todo.navigate().await?;
//! ```
//!
//! Every driver call advances the app by one tick, so persistence lag is
//! measured in driver round-trips rather than wall-clock time.

mod docs_site;
mod element;
pub mod matcher;
mod todomvc;

pub use docs_site::DocsSiteApp;
pub use element::MockElement;
pub use todomvc::TodoMvcApp;

use crate::driver::{Action, Actionability, Driver, ElementState};
use crate::locator::Selector;
use crate::result::{PagecheckError, PagecheckResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// PNG file signature; mock captures start with it
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A simulated web application
pub trait MockApp: Send + Debug {
    /// Load `url`; unknown hosts fail like an unreachable server
    fn navigate(&mut self, url: &str) -> PagecheckResult<()>;

    /// Reload the current document, keeping only persisted state
    fn reload(&mut self);

    /// Go back one history entry
    fn go_back(&mut self);

    /// Current URL
    fn url(&self) -> String;

    /// Document title
    fn title(&self) -> String;

    /// Render the current document
    fn render(&self) -> MockElement;

    /// Apply `action` to the element rendered with `key`
    fn act(&mut self, key: &str, action: &Action);

    /// Key press on the focused element
    fn press_key(&mut self, key: &str);

    /// `localStorage` lookup
    fn local_storage(&self, key: &str) -> Option<String>;

    /// Advance simulated time by one driver round-trip
    fn tick(&mut self) {}
}

/// Driver backed by a [`MockApp`]
#[derive(Debug)]
pub struct MockDriver {
    app: Mutex<Box<dyn MockApp>>,
    history: Mutex<Vec<String>>,
    load_delay_ms: u64,
    fail_close: bool,
    closed: AtomicBool,
}

impl MockDriver {
    /// Host `app`
    #[must_use]
    pub fn new(app: impl MockApp + 'static) -> Self {
        Self {
            app: Mutex::new(Box::new(app)),
            history: Mutex::new(Vec::new()),
            load_delay_ms: 0,
            fail_close: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Delay every navigation by `ms` (tokio time)
    #[must_use]
    pub const fn with_load_delay_ms(mut self, ms: u64) -> Self {
        self.load_delay_ms = ms;
        self
    }

    /// Make [`Driver::close`] report an error after closing
    #[must_use]
    pub const fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Calls made so far, as `method:argument`
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        if let Ok(mut history) = self.history.lock() {
            history.push(call);
        }
    }

    /// Lock the app and advance it one tick
    fn app(&self) -> PagecheckResult<MutexGuard<'_, Box<dyn MockApp>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PagecheckError::session("page has been closed"));
        }
        let mut app = self
            .app
            .lock()
            .map_err(|_| PagecheckError::session("mock app state poisoned"))?;
        app.tick();
        Ok(app)
    }

    async fn load_delay(&self) {
        if self.load_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.load_delay_ms)).await;
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn goto(&self, url: &str, load_state: LoadState) -> PagecheckResult<()> {
        self.record(format!("goto:{url}"));
        debug!(url, %load_state, "mock navigation");
        self.load_delay().await;
        self.app()?.navigate(url)
    }

    async fn reload(&self, _load_state: LoadState) -> PagecheckResult<()> {
        self.record("reload".to_string());
        self.load_delay().await;
        self.app()?.reload();
        Ok(())
    }

    async fn go_back(&self) -> PagecheckResult<()> {
        self.record("go_back".to_string());
        self.app()?.go_back();
        Ok(())
    }

    async fn url(&self) -> PagecheckResult<String> {
        Ok(self.app()?.url())
    }

    async fn title(&self) -> PagecheckResult<String> {
        Ok(self.app()?.title())
    }

    async fn query(&self, selector: &Selector) -> PagecheckResult<Vec<ElementState>> {
        let app = self.app()?;
        let root = app.render();
        Ok(matcher::resolve(&root, selector)
            .iter()
            .map(|r| r.element.state(r.visible))
            .collect())
    }

    async fn perform(
        &self,
        selector: &Selector,
        action: &Action,
    ) -> PagecheckResult<Actionability> {
        let mut app = self.app()?;
        let root = app.render();
        let matches = matcher::resolve(&root, selector);
        let states: Vec<ElementState> = matches.iter().map(|r| r.element.state(r.visible)).collect();
        let verdict = Actionability::of(&states, action);
        if verdict == Actionability::Ready {
            let key = matches[0].element.key.clone();
            self.record(format!("{}:{key}", action.name()));
            app.act(&key, action);
        }
        Ok(verdict)
    }

    async fn press_key(&self, key: &str) -> PagecheckResult<()> {
        self.record(format!("press_key:{key}"));
        self.app()?.press_key(key);
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> PagecheckResult<serde_json::Value> {
        let app = self.app()?;
        match script.trim().trim_end_matches(';') {
            "document.title" => Ok(app.title().into()),
            "location.href" | "window.location.href" | "document.URL" => Ok(app.url().into()),
            other => Err(PagecheckError::evaluation(format!(
                "mock driver cannot evaluate '{other}'"
            ))),
        }
    }

    async fn local_storage(&self, key: &str) -> PagecheckResult<Option<String>> {
        Ok(self.app()?.local_storage(key))
    }

    async fn screenshot(&self) -> PagecheckResult<Vec<u8>> {
        let app = self.app()?;
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(format!("{:?}", app.render()).as_bytes());
        Ok(bytes)
    }

    async fn close(&self) -> PagecheckResult<()> {
        self.record("close".to_string());
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(PagecheckError::session("target crashed while closing"));
        }
        Ok(())
    }
}
