//! Page objects for the two target applications.
//!
//! A page object wraps a [`Page`] handle and a fixed set of named locators
//! computed at construction. Construction never touches the browser; the
//! first interaction happens in [`PageObject::navigate`] or a named action.
//!
//! ```rust,ignore
//! let docs = DocsHomePage::from_page(page);
//! docs.navigate().await?;
//! docs.open_search().await?;
//! expect(&docs.search_input).to_be_visible().await?;
//! ```

mod docs_home;
mod todomvc;

pub use docs_home::{DocsHomePage, DOCS_INTRO_URL, DOCS_TITLE};
pub use todomvc::{EditCommit, Filter, TodoMvcPage, DEFAULT_TODOS};

use crate::page::Page;
use crate::result::PagecheckResult;
use async_trait::async_trait;

/// Documentation site home
pub const DOCS_URL: &str = "https://playwright.dev";

/// TodoMVC demo application
pub const TODOMVC_URL: &str = "https://demo.playwright.dev/todomvc";

/// A page or component with named locators and intention-revealing actions.
#[async_trait]
pub trait PageObject: Send + Sync + Sized {
    /// Address loaded by [`navigate`](Self::navigate)
    const URL: &'static str;

    /// Build the page object; no browser interaction
    fn from_page(page: Page) -> Self;

    /// The underlying page handle
    fn page(&self) -> &Page;

    /// Name for logs and trace files
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Full document load of [`URL`](Self::URL)
    async fn navigate(&self) -> PagecheckResult<()> {
        self.page().goto(Self::URL).await
    }

    /// Whether the page's landmark element is visible right now
    async fn is_loaded(&self) -> PagecheckResult<bool>;
}
