//! Documentation site home page.

use super::{PageObject, DOCS_URL};
use crate::locator::{Locator, Role, TextMatch};
use crate::page::Page;
use crate::result::PagecheckResult;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tracing::debug;

/// Title of the home page
pub const DOCS_TITLE: &str = "Fast and reliable end-to-end testing for modern web apps | Playwright";

/// Where the "Docs" navbar link leads
pub const DOCS_INTRO_URL: &str = "https://playwright.dev/docs/intro";

/// Home page of the documentation site
#[derive(Debug, Clone)]
pub struct DocsHomePage {
    page: Page,
    /// Dark/light mode switch in the navbar
    pub mode_button: Locator,
    /// Footer copyright line
    pub copyright: Locator,
    /// Navbar search button
    pub search: Locator,
    /// "Docs" navbar link
    pub docs_link: Locator,
    /// Input inside the search modal
    pub search_input: Locator,
    /// Calendar year at construction
    pub year: i32,
}

impl DocsHomePage {
    /// Open the search modal
    pub async fn open_search(&self) -> PagecheckResult<()> {
        debug!("opening search");
        self.search.click().await
    }

    /// Dismiss the search modal with Escape
    pub async fn close_search(&self) -> PagecheckResult<()> {
        self.search_input.press("Escape").await
    }

    /// Follow the "Docs" link
    pub async fn open_docs(&self) -> PagecheckResult<()> {
        self.docs_link.click().await
    }

    /// Toggle the colour mode
    pub async fn toggle_mode(&self) -> PagecheckResult<()> {
        self.mode_button.click().await
    }
}

#[async_trait]
impl PageObject for DocsHomePage {
    const URL: &'static str = DOCS_URL;

    fn from_page(page: Page) -> Self {
        Self {
            mode_button: page.get_by_label("Switch between dark and light"),
            copyright: page.get_by_text(TextMatch::pattern("Copyright")),
            search: page.get_by_label("Search"),
            docs_link: page.get_by_role_named(Role::Link, "Docs"),
            search_input: page.get_by_placeholder("search docs"),
            year: Utc::now().year(),
            page,
        }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    fn name(&self) -> &str {
        "docs-home"
    }

    async fn is_loaded(&self) -> PagecheckResult<bool> {
        self.search.is_visible().await
    }
}
