//! Locator abstraction for element selection and interaction.
//!
//! A [`Locator`] is a lazily-resolved query: building one never touches the
//! browser. Resolution happens on every action or query, so a locator stays
//! valid across re-renders.
//!
//! # Design Philosophy
//!
//! - **Auto-Waiting**: actions wait until the element is actionable
//! - **Strict Selection**: single-element actions fail if several elements match
//! - **Scoped Lookup**: later selector steps search inside earlier matches
//! - **Fluent API**: chainable methods for building complex selectors

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::driver::{Action, ElementState};
use crate::page::Page;
use crate::result::PagecheckResult;

// =============================================================================
// TEXT MATCHING
// =============================================================================

/// How a selector step compares element text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TextMatch {
    /// Case-insensitive substring after whitespace normalization
    Substring(String),
    /// Whole-string equality after whitespace normalization
    Exact(String),
    /// Regular expression search
    Pattern(String),
}

impl TextMatch {
    /// Case-insensitive substring match
    #[must_use]
    pub fn substring(text: impl Into<String>) -> Self {
        Self::Substring(text.into())
    }

    /// Exact match
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    /// Regular expression match
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// Check whether `text` satisfies this matcher.
    ///
    /// An invalid pattern matches nothing.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let text = normalize_whitespace(text);
        match self {
            Self::Substring(needle) => text
                .to_lowercase()
                .contains(&normalize_whitespace(needle).to_lowercase()),
            Self::Exact(expected) => text == normalize_whitespace(expected),
            Self::Pattern(pattern) => Regex::new(pattern)
                .map(|re| re.is_match(&text))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(s) => write!(f, "{s:?}"),
            Self::Exact(s) => write!(f, "{s:?}, exact"),
            Self::Pattern(p) => write!(f, "/{p}/"),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(s: &str) -> Self {
        Self::Substring(s.to_string())
    }
}

impl From<String> for TextMatch {
    fn from(s: String) -> Self {
        Self::Substring(s)
    }
}

impl From<&Regex> for TextMatch {
    fn from(re: &Regex) -> Self {
        Self::Pattern(re.as_str().to_string())
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// ROLES
// =============================================================================

/// ARIA roles the locator layer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// `<button>`, `input[type=button|submit|reset]`
    Button,
    /// `input[type=checkbox]`
    Checkbox,
    /// Modal or non-modal dialog
    Dialog,
    /// `<h1>` .. `<h6>`
    Heading,
    /// `<a href>`
    Link,
    /// `<li>`
    ListItem,
    /// `input[type=search]`
    Searchbox,
    /// `<input>` text-like and `<textarea>`
    Textbox,
}

impl Role {
    /// ARIA role name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Dialog => "dialog",
            Self::Heading => "heading",
            Self::Link => "link",
            Self::ListItem => "listitem",
            Self::Searchbox => "searchbox",
            Self::Textbox => "textbox",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SELECTOR
// =============================================================================

/// One step of a [`Selector`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SelectorStep {
    /// Elements with an ARIA role and optional accessible name
    Role {
        /// Role to match
        role: Role,
        /// Accessible name
        name: Option<TextMatch>,
    },
    /// Form controls by associated label or `aria-label`
    Label {
        /// Label text
        text: TextMatch,
    },
    /// Inputs by placeholder
    Placeholder {
        /// Placeholder text
        text: TextMatch,
    },
    /// Smallest elements whose text content matches
    Text {
        /// Text to match
        text: TextMatch,
    },
    /// Elements by `data-testid`
    TestId {
        /// Test id value
        id: String,
    },
    /// CSS selector
    Css {
        /// Selector string
        css: String,
    },
    /// Keep matches whose text content matches
    HasText {
        /// Text to match
        text: TextMatch,
    },
    /// Keep the n-th match (zero-based)
    Nth {
        /// Index
        index: usize,
    },
    /// Keep the first match
    First,
    /// Keep the last match
    Last,
}

impl SelectorStep {
    /// Whether this step filters the current match list instead of
    /// searching inside it
    #[must_use]
    pub const fn is_filter(&self) -> bool {
        matches!(
            self,
            Self::HasText { .. } | Self::Nth { .. } | Self::First | Self::Last
        )
    }
}

impl fmt::Display for SelectorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role { role, name: None } => write!(f, "get_by_role({role})"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "get_by_role({role}, name={name})"),
            Self::Label { text } => write!(f, "get_by_label({text})"),
            Self::Placeholder { text } => write!(f, "get_by_placeholder({text})"),
            Self::Text { text } => write!(f, "get_by_text({text})"),
            Self::TestId { id } => write!(f, "get_by_test_id({id:?})"),
            Self::Css { css } => write!(f, "locator({css:?})"),
            Self::HasText { text } => write!(f, "filter(has_text={text})"),
            Self::Nth { index } => write!(f, "nth({index})"),
            Self::First => f.write_str("first()"),
            Self::Last => f.write_str("last()"),
        }
    }
}

/// Ordered list of selector steps.
///
/// The first step searches the whole document; each later search step
/// searches inside the matches of the steps before it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector {
    steps: Vec<SelectorStep>,
}

impl Selector {
    /// Selector with a single step
    #[must_use]
    pub fn new(step: SelectorStep) -> Self {
        Self { steps: vec![step] }
    }

    /// By ARIA role
    #[must_use]
    pub fn role(role: Role) -> Self {
        Self::new(SelectorStep::Role { role, name: None })
    }

    /// By ARIA role and accessible name
    #[must_use]
    pub fn role_named(role: Role, name: impl Into<TextMatch>) -> Self {
        Self::new(SelectorStep::Role {
            role,
            name: Some(name.into()),
        })
    }

    /// By label
    #[must_use]
    pub fn label(text: impl Into<TextMatch>) -> Self {
        Self::new(SelectorStep::Label { text: text.into() })
    }

    /// By placeholder
    #[must_use]
    pub fn placeholder(text: impl Into<TextMatch>) -> Self {
        Self::new(SelectorStep::Placeholder { text: text.into() })
    }

    /// By text content
    #[must_use]
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::new(SelectorStep::Text { text: text.into() })
    }

    /// By test id
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(SelectorStep::TestId { id: id.into() })
    }

    /// By CSS
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self::new(SelectorStep::Css { css: css.into() })
    }

    /// Append a step
    #[must_use]
    pub fn then(mut self, step: SelectorStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Append every step of `other`, scoping it inside this selector
    #[must_use]
    pub fn chain(mut self, other: &Self) -> Self {
        self.steps.extend(other.steps.iter().cloned());
        self
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[SelectorStep] {
        &self.steps
    }

    /// Serialize the steps for the in-page resolver
    pub fn to_json(&self) -> PagecheckResult<String> {
        Ok(serde_json::to_string(&self.steps)?)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str(":root");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

// =============================================================================
// LOCATOR
// =============================================================================

/// A selector bound to a page session.
///
/// ```ignore
/// let new_todo = page.get_by_placeholder("What needs to be done?");
/// new_todo.fill("buy some cheese").await?;
/// new_todo.press("Enter").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Locator {
    page: Page,
    selector: Selector,
}

impl Locator {
    /// Bind a selector to a page
    #[must_use]
    pub const fn new(page: Page, selector: Selector) -> Self {
        Self { page, selector }
    }

    /// Underlying selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Page this locator resolves against
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    fn with_step(&self, step: SelectorStep) -> Self {
        Self {
            page: self.page.clone(),
            selector: self.selector.clone().then(step),
        }
    }

    // -------------------------------------------------------------------------
    // Refinement
    // -------------------------------------------------------------------------

    /// The n-th match (zero-based)
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        self.with_step(SelectorStep::Nth { index })
    }

    /// The first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.with_step(SelectorStep::First)
    }

    /// The last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.with_step(SelectorStep::Last)
    }

    /// Keep matches containing `text`
    #[must_use]
    pub fn filter_has_text(&self, text: impl Into<TextMatch>) -> Self {
        self.with_step(SelectorStep::HasText { text: text.into() })
    }

    /// CSS lookup inside the matches
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Self {
        self.with_step(SelectorStep::Css { css: css.into() })
    }

    /// Role lookup inside the matches
    #[must_use]
    pub fn get_by_role(&self, role: Role) -> Self {
        self.with_step(SelectorStep::Role { role, name: None })
    }

    /// Role and accessible name lookup inside the matches
    #[must_use]
    pub fn get_by_role_named(&self, role: Role, name: impl Into<TextMatch>) -> Self {
        self.with_step(SelectorStep::Role {
            role,
            name: Some(name.into()),
        })
    }

    /// Label lookup inside the matches
    #[must_use]
    pub fn get_by_label(&self, text: impl Into<TextMatch>) -> Self {
        self.with_step(SelectorStep::Label { text: text.into() })
    }

    /// Placeholder lookup inside the matches
    #[must_use]
    pub fn get_by_placeholder(&self, text: impl Into<TextMatch>) -> Self {
        self.with_step(SelectorStep::Placeholder { text: text.into() })
    }

    /// Text lookup inside the matches
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<TextMatch>) -> Self {
        self.with_step(SelectorStep::Text { text: text.into() })
    }

    /// Test id lookup inside the matches
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Self {
        self.with_step(SelectorStep::TestId { id: id.into() })
    }

    // -------------------------------------------------------------------------
    // Actions (auto-wait, strict)
    // -------------------------------------------------------------------------

    /// Click the element
    pub async fn click(&self) -> PagecheckResult<()> {
        self.page.perform(&self.selector, Action::Click).await
    }

    /// Double-click the element
    pub async fn dblclick(&self) -> PagecheckResult<()> {
        self.page.perform(&self.selector, Action::DoubleClick).await
    }

    /// Replace the value of an input
    pub async fn fill(&self, text: impl Into<String>) -> PagecheckResult<()> {
        self.page
            .perform(&self.selector, Action::Fill(text.into()))
            .await
    }

    /// Focus the element and press a key (`"Enter"`, `"Escape"`, ...)
    pub async fn press(&self, key: impl Into<String>) -> PagecheckResult<()> {
        self.page
            .perform(&self.selector, Action::Press(key.into()))
            .await
    }

    /// Ensure a checkbox is checked
    pub async fn check(&self) -> PagecheckResult<()> {
        self.page.perform(&self.selector, Action::Check).await
    }

    /// Ensure a checkbox is unchecked
    pub async fn uncheck(&self) -> PagecheckResult<()> {
        self.page.perform(&self.selector, Action::Uncheck).await
    }

    /// Focus the element
    pub async fn focus(&self) -> PagecheckResult<()> {
        self.page.perform(&self.selector, Action::Focus).await
    }

    /// Remove focus from the element
    pub async fn blur(&self) -> PagecheckResult<()> {
        self.page.perform(&self.selector, Action::Blur).await
    }

    /// Dispatch a DOM event (`"blur"`, `"change"`, ...) on the element
    pub async fn dispatch_event(&self, event: impl Into<String>) -> PagecheckResult<()> {
        self.page
            .perform(&self.selector, Action::DispatchEvent(event.into()))
            .await
    }

    // -------------------------------------------------------------------------
    // Queries (no waiting)
    // -------------------------------------------------------------------------

    /// Snapshot of every match
    pub async fn all(&self) -> PagecheckResult<Vec<ElementState>> {
        self.page.query(&self.selector).await
    }

    /// Number of matches
    pub async fn count(&self) -> PagecheckResult<usize> {
        Ok(self.all().await?.len())
    }

    /// Normalized text of every match
    pub async fn all_text_contents(&self) -> PagecheckResult<Vec<String>> {
        Ok(self
            .all()
            .await?
            .iter()
            .map(|e| normalize_whitespace(&e.text))
            .collect())
    }

    /// Whether exactly one match exists and is visible
    pub async fn is_visible(&self) -> PagecheckResult<bool> {
        let all = self.all().await?;
        Ok(all.len() == 1 && all[0].visible)
    }

    /// Current value of the first matching input
    pub async fn input_value(&self) -> PagecheckResult<Option<String>> {
        Ok(self.all().await?.into_iter().next().and_then(|e| e.value))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)
    }
}
