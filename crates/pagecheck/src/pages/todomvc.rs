//! TodoMVC page object.

use super::{PageObject, TODOMVC_URL};
use crate::convergence::ConvergencePoller;
use crate::locator::{Locator, Role, TextMatch};
use crate::page::Page;
use crate::result::PagecheckResult;
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// The three canonical titles used across scenarios
pub const DEFAULT_TODOS: [&str; 3] = ["buy some cheese", "feed the cat", "book a doctors appointment"];

/// List filter, selected through the footer links and the URL fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Every item
    #[default]
    All,
    /// Items not yet completed
    Active,
    /// Completed items
    Completed,
}

impl Filter {
    /// Every filter, in footer order
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Link text
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }

    /// Lowercase identifier
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Route segment after `#/`
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Parse a URL fragment (`#/active`, `/completed`, ...); unknown routes
    /// show everything
    #[must_use]
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim_start_matches('#').trim_matches('/') {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }

    /// Full URL of this route
    #[must_use]
    pub fn url(self) -> String {
        format!("{TODOMVC_URL}/#/{}", self.path())
    }

    /// Whether an item with this completion state is listed
    #[must_use]
    pub const fn includes(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Active => !completed,
            Self::Completed => completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How an inline edit is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommit {
    /// Press Enter: save
    Enter,
    /// Leave the field: save
    Blur,
    /// Press Escape: discard
    Escape,
}

/// TodoMVC list page
#[derive(Debug, Clone)]
pub struct TodoMvcPage {
    page: Page,
    /// "What needs to be done?" input
    pub new_todo: Locator,
    /// Every listed item
    pub todo_items: Locator,
    /// Title labels of listed items
    pub todo_titles: Locator,
    /// "N items left" counter
    pub todo_count: Locator,
    /// "Mark all as complete" checkbox
    pub toggle_all: Locator,
    /// "Clear completed" button
    pub clear_completed: Locator,
    all_link: Locator,
    active_link: Locator,
    completed_link: Locator,
}

impl TodoMvcPage {
    /// Item at `index` among the listed items
    #[must_use]
    pub fn item(&self, index: usize) -> Locator {
        self.todo_items.nth(index)
    }

    /// Completion checkbox of item `index`
    #[must_use]
    pub fn item_checkbox(&self, index: usize) -> Locator {
        self.item(index).get_by_role(Role::Checkbox)
    }

    /// Title label of item `index`
    #[must_use]
    pub fn item_title(&self, index: usize) -> Locator {
        self.item(index).get_by_test_id("todo-title")
    }

    /// Inline editor of item `index`, present only while editing
    #[must_use]
    pub fn item_editor(&self, index: usize) -> Locator {
        self.item(index).get_by_role_named(Role::Textbox, "Edit")
    }

    /// Footer link for `filter`
    #[must_use]
    pub fn filter_link(&self, filter: Filter) -> &Locator {
        match filter {
            Filter::All => &self.all_link,
            Filter::Active => &self.active_link,
            Filter::Completed => &self.completed_link,
        }
    }

    /// Poller over this page's persisted records
    #[must_use]
    pub fn records(&self) -> ConvergencePoller {
        ConvergencePoller::new(self.page.clone())
    }

    /// Type `text` into the new-todo input and press Enter
    pub async fn add_todo(&self, text: &str) -> PagecheckResult<()> {
        debug!(text, "adding todo");
        self.new_todo.fill(text).await?;
        self.new_todo.press("Enter").await
    }

    /// Add each title in order
    pub async fn add_todos<I, S>(&self, titles: I) -> PagecheckResult<()>
    where
        I: IntoIterator<Item = S> + Send,
        I::IntoIter: Send,
        S: AsRef<str> + Send,
    {
        for title in titles {
            self.add_todo(title.as_ref()).await?;
        }
        Ok(())
    }

    /// Add [`DEFAULT_TODOS`]
    pub async fn create_default_todos(&self) -> PagecheckResult<()> {
        self.add_todos(DEFAULT_TODOS).await
    }

    /// Click the checkbox of item `index`
    pub async fn toggle_item(&self, index: usize) -> PagecheckResult<()> {
        self.item_checkbox(index).click().await
    }

    /// Ensure item `index` is completed
    pub async fn check_item(&self, index: usize) -> PagecheckResult<()> {
        self.item_checkbox(index).check().await
    }

    /// Ensure item `index` is active
    pub async fn uncheck_item(&self, index: usize) -> PagecheckResult<()> {
        self.item_checkbox(index).uncheck().await
    }

    /// Double-click item `index` to open its editor
    pub async fn begin_edit(&self, index: usize) -> PagecheckResult<()> {
        self.item(index).dblclick().await
    }

    /// Replace the title of item `index` and finish the edit with `commit`
    pub async fn edit_item(
        &self,
        index: usize,
        text: &str,
        commit: EditCommit,
    ) -> PagecheckResult<()> {
        self.begin_edit(index).await?;
        let editor = self.item_editor(index);
        editor.fill(text).await?;
        match commit {
            EditCommit::Enter => editor.press("Enter").await,
            EditCommit::Blur => editor.dispatch_event("blur").await,
            EditCommit::Escape => editor.press("Escape").await,
        }
    }

    /// Check "Mark all as complete"
    pub async fn mark_all_complete(&self) -> PagecheckResult<()> {
        self.toggle_all.check().await
    }

    /// Uncheck "Mark all as complete"
    pub async fn clear_all_complete(&self) -> PagecheckResult<()> {
        self.toggle_all.uncheck().await
    }

    /// Click "Clear completed"
    pub async fn clear_completed_items(&self) -> PagecheckResult<()> {
        self.clear_completed.click().await
    }

    /// Switch the list filter
    pub async fn show(&self, filter: Filter) -> PagecheckResult<()> {
        self.filter_link(filter).click().await
    }
}

#[async_trait]
impl PageObject for TodoMvcPage {
    const URL: &'static str = TODOMVC_URL;

    fn from_page(page: Page) -> Self {
        let link = |filter: Filter| page.get_by_role_named(Role::Link, TextMatch::exact(filter.label()));
        Self {
            new_todo: page.get_by_placeholder("What needs to be done?"),
            todo_items: page.get_by_test_id("todo-item"),
            todo_titles: page.get_by_test_id("todo-title"),
            todo_count: page.get_by_test_id("todo-count"),
            toggle_all: page.get_by_label("Mark all as complete"),
            clear_completed: page.get_by_role_named(Role::Button, "Clear completed"),
            all_link: link(Filter::All),
            active_link: link(Filter::Active),
            completed_link: link(Filter::Completed),
            page,
        }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    fn name(&self) -> &str {
        "todomvc"
    }

    async fn is_loaded(&self) -> PagecheckResult<bool> {
        self.new_todo.is_visible().await
    }
}
