//! Fixtures: per-case page sessions with setup and teardown.
//!
//! A [`SessionFactory`] opens page sessions; [`PageFixture`] turns one
//! session into a navigated page object and closes it afterwards. Each case
//! attempt gets its own fixture, so no browser state crosses attempts.

use crate::driver::Driver;
use crate::mock::{DocsSiteApp, MockApp, MockDriver, TodoMvcApp};
use crate::page::{Page, PageOptions};
use crate::pages::PageObject;
use crate::result::{PagecheckError, PagecheckResult};
use crate::tracing_support::StepTracer;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Something a case needs set up before its body and torn down after it.
#[async_trait]
pub trait Fixture: Send {
    /// Set up the fixture before the case body runs.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails; the fixture is then [`FixtureState::Failed`]
    /// and [`teardown`](Self::teardown) still releases what was acquired.
    async fn setup(&mut self) -> PagecheckResult<()>;

    /// Tear down the fixture after the case body.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the resource fails.
    async fn teardown(&mut self) -> PagecheckResult<()>;

    /// Current lifecycle state
    fn state(&self) -> FixtureState;

    /// Name for logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Lifecycle of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Created, not set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup or teardown failed
    Failed,
}

/// Opens page sessions, each in its own browser context.
#[async_trait]
pub trait SessionFactory: Send + Sync + fmt::Debug {
    /// Open a fresh driver session
    async fn new_driver(&self) -> PagecheckResult<Arc<dyn Driver>>;

    /// Open a session wrapped in a [`Page`]
    async fn new_page(
        &self,
        options: PageOptions,
        tracer: Option<StepTracer>,
    ) -> PagecheckResult<Page> {
        let page = Page::new(self.new_driver().await?).with_options(options);
        Ok(match tracer {
            Some(tracer) => page.with_tracer(tracer),
            None => page,
        })
    }
}

type MakeDriver = dyn Fn() -> MockDriver + Send + Sync;

/// Sessions backed by freshly built [`MockApp`]s
#[derive(Clone)]
pub struct MockSessionFactory {
    make: Arc<MakeDriver>,
    opened: Arc<AtomicUsize>,
}

impl fmt::Debug for MockSessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSessionFactory")
            .field("opened", &self.sessions_opened())
            .finish()
    }
}

impl MockSessionFactory {
    /// Every session hosts a new app built by `make`
    #[must_use]
    pub fn new<A, F>(make: F) -> Self
    where
        A: MockApp + 'static,
        F: Fn() -> A + Send + Sync + 'static,
    {
        Self::from_driver(move || MockDriver::new(make()))
    }

    /// Every session is a driver built by `make`
    #[must_use]
    pub fn from_driver(make: impl Fn() -> MockDriver + Send + Sync + 'static) -> Self {
        Self {
            make: Arc::new(make),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fresh TodoMVC apps
    #[must_use]
    pub fn todomvc() -> Self {
        Self::new(TodoMvcApp::new)
    }

    /// Fresh documentation sites
    #[must_use]
    pub fn docs_site() -> Self {
        Self::new(DocsSiteApp::new)
    }

    /// Sessions opened so far
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn new_driver(&self) -> PagecheckResult<Arc<dyn Driver>> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(session = n, "opening mock session");
        Ok(Arc::new((self.make)()))
    }
}

#[cfg(feature = "browser")]
pub use cdp::CdpSessionFactory;

#[cfg(feature = "browser")]
mod cdp {
    use super::{Arc, Driver, PagecheckResult, SessionFactory};
    use crate::browser::CdpBrowser;
    use crate::config::RunConfig;
    use async_trait::async_trait;

    /// Sessions in isolated contexts of one Chromium process
    #[derive(Debug)]
    pub struct CdpSessionFactory {
        browser: CdpBrowser,
    }

    impl CdpSessionFactory {
        /// Launch Chromium with the run's browser and emulation settings
        pub async fn launch(config: &RunConfig) -> PagecheckResult<Self> {
            let browser =
                CdpBrowser::launch(config.browser.clone(), config.emulation.clone()).await?;
            Ok(Self { browser })
        }

        /// Shut the browser down
        pub async fn close(self) -> PagecheckResult<()> {
            self.browser.close().await
        }
    }

    #[async_trait]
    impl SessionFactory for CdpSessionFactory {
        async fn new_driver(&self) -> PagecheckResult<Arc<dyn Driver>> {
            Ok(Arc::new(self.browser.new_driver().await?))
        }
    }
}

/// A page object of type `P` on its own session, navigated at setup
pub struct PageFixture<P> {
    factory: Arc<dyn SessionFactory>,
    options: PageOptions,
    tracer: Option<StepTracer>,
    session: Option<Page>,
    object: Option<P>,
    state: FixtureState,
}

impl<P> fmt::Debug for PageFixture<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFixture")
            .field("page", &std::any::type_name::<P>())
            .field("state", &self.state)
            .field("traced", &self.tracer.is_some())
            .finish()
    }
}

impl<P: PageObject> PageFixture<P> {
    /// Fixture opening sessions from `factory` with `options`
    #[must_use]
    pub fn new(factory: Arc<dyn SessionFactory>, options: PageOptions) -> Self {
        Self {
            factory,
            options,
            tracer: None,
            session: None,
            object: None,
            state: FixtureState::Registered,
        }
    }

    /// Record the session's steps into `tracer`
    #[must_use]
    pub fn with_tracer(mut self, tracer: Option<StepTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// The navigated page object
    ///
    /// # Errors
    ///
    /// Returns a fixture error unless setup succeeded.
    pub fn get(&self) -> PagecheckResult<&P> {
        match (&self.object, self.state) {
            (Some(object), FixtureState::SetUp) => Ok(object),
            (_, state) => Err(PagecheckError::fixture(format!(
                "{} is not set up (state: {state:?})",
                std::any::type_name::<P>()
            ))),
        }
    }

    /// The raw session, available as soon as it is opened
    #[must_use]
    pub const fn session(&self) -> Option<&Page> {
        self.session.as_ref()
    }
}

#[async_trait]
impl<P: PageObject + 'static> Fixture for PageFixture<P> {
    async fn setup(&mut self) -> PagecheckResult<()> {
        let page = match self
            .factory
            .new_page(self.options, self.tracer.clone())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.state = FixtureState::Failed;
                return Err(e);
            }
        };
        self.session = Some(page.clone());

        let object = P::from_page(page);
        debug!(page = object.name(), url = P::URL, "fixture navigating");
        if let Err(e) = object.navigate().await {
            warn!(page = object.name(), error = %e, "fixture setup failed");
            self.state = FixtureState::Failed;
            return Err(e);
        }
        self.object = Some(object);
        self.state = FixtureState::SetUp;
        Ok(())
    }

    async fn teardown(&mut self) -> PagecheckResult<()> {
        self.object = None;
        let Some(session) = self.session.take() else {
            if self.state == FixtureState::SetUp {
                self.state = FixtureState::TornDown;
            }
            return Ok(());
        };
        match session.close().await {
            Ok(()) => {
                if self.state != FixtureState::Failed {
                    self.state = FixtureState::TornDown;
                }
                Ok(())
            }
            Err(e) => {
                self.state = FixtureState::Failed;
                Err(PagecheckError::fixture(format!(
                    "closing {} failed: {e}",
                    std::any::type_name::<P>()
                )))
            }
        }
    }

    fn state(&self) -> FixtureState {
        self.state
    }
}
