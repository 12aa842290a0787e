//! Driver - Abstract Browser Automation Trait
//!
//! Every page session talks to the browser through [`Driver`]. Two
//! implementations ship with the crate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Driver (async trait)                                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐  │
//! │  │  CdpDriver               │  │  MockDriver              │  │
//! │  │  (feature "browser")     │  │  (always available)      │  │
//! │  │  Chromium over CDP via   │  │  In-memory document      │  │
//! │  │  chromiumoxide           │  │  hosting a MockApp       │  │
//! │  └──────────────────────────┘  └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drivers never wait for actionability themselves: `perform` reports an
//! [`Actionability`] verdict and the locator layer decides whether to retry.

use crate::locator::Selector;
use crate::result::PagecheckResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of one matched element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementState {
    /// Lowercase tag name
    pub tag: String,
    /// Text content (raw)
    pub text: String,
    /// Current value for form controls
    pub value: Option<String>,
    /// `class` attribute
    pub class: String,
    /// Rendered with a non-empty box and not hidden by style
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Checked state for checkboxes
    pub checked: Option<bool>,
}

impl ElementState {
    /// Create a visible, enabled element state
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set class attribute
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Individual class names
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class.split_whitespace()
    }

    /// Check for a single class name
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|c| c == name)
    }
}

/// A primitive interaction dispatched to one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "arg", rename_all = "snake_case")]
pub enum Action {
    /// Single left click
    Click,
    /// Double left click
    DoubleClick,
    /// Replace the input value
    Fill(String),
    /// Focus then press a key
    Press(String),
    /// Click if unchecked
    Check,
    /// Click if checked
    Uncheck,
    /// Focus
    Focus,
    /// Blur
    Blur,
    /// Dispatch a DOM event by name
    DispatchEvent(String),
}

impl Action {
    /// Short name used in logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
            Self::Fill(_) => "fill",
            Self::Press(_) => "press",
            Self::Check => "check",
            Self::Uncheck => "uncheck",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::DispatchEvent(_) => "dispatch_event",
        }
    }

    /// Whether the target must be visible and enabled, or merely attached
    #[must_use]
    pub const fn requires_interactable(&self) -> bool {
        matches!(
            self,
            Self::Click | Self::DoubleClick | Self::Fill(_) | Self::Check | Self::Uncheck
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill(text) => write!(f, "fill({text:?})"),
            Self::Press(key) => write!(f, "press({key:?})"),
            Self::DispatchEvent(event) => write!(f, "dispatch_event({event:?})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Outcome of one `perform` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "count", rename_all = "snake_case")]
pub enum Actionability {
    /// Action dispatched
    Ready,
    /// No element matched
    Missing,
    /// More than one element matched
    Ambiguous(usize),
    /// Matched element is not visible
    Hidden,
    /// Matched element is disabled
    Disabled,
}

impl Actionability {
    /// Verdict for a resolved match list
    #[must_use]
    pub fn of(matches: &[ElementState], action: &Action) -> Self {
        match matches {
            [] => Self::Missing,
            [el] if action.requires_interactable() && !el.visible => Self::Hidden,
            [el] if action.requires_interactable() && !el.enabled => Self::Disabled,
            [_] => Self::Ready,
            many => Self::Ambiguous(many.len()),
        }
    }
}

impl fmt::Display for Actionability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("element ready"),
            Self::Missing => f.write_str("no element matched"),
            Self::Ambiguous(n) => write!(f, "{n} elements matched"),
            Self::Hidden => f.write_str("element is not visible"),
            Self::Disabled => f.write_str("element is disabled"),
        }
    }
}

/// Browser primitives used by pages, locators and the convergence poller
#[async_trait]
pub trait Driver: Send + Sync + fmt::Debug {
    /// Navigate to `url` and wait for `load_state`
    async fn goto(&self, url: &str, load_state: LoadState) -> PagecheckResult<()>;

    /// Reload the current document
    async fn reload(&self, load_state: LoadState) -> PagecheckResult<()>;

    /// Go back one history entry
    async fn go_back(&self) -> PagecheckResult<()>;

    /// Current URL
    async fn url(&self) -> PagecheckResult<String>;

    /// Document title
    async fn title(&self) -> PagecheckResult<String>;

    /// Resolve `selector` and snapshot every match
    async fn query(&self, selector: &Selector) -> PagecheckResult<Vec<ElementState>>;

    /// Resolve `selector` and dispatch `action` if exactly one actionable
    /// element matched
    async fn perform(&self, selector: &Selector, action: &Action)
        -> PagecheckResult<Actionability>;

    /// Press a key on whatever element has focus
    async fn press_key(&self, key: &str) -> PagecheckResult<()>;

    /// Evaluate a JavaScript expression
    async fn evaluate(&self, script: &str) -> PagecheckResult<serde_json::Value>;

    /// Raw `localStorage` value
    async fn local_storage(&self, key: &str) -> PagecheckResult<Option<String>>;

    /// Viewport capture as PNG
    async fn screenshot(&self) -> PagecheckResult<Vec<u8>>;

    /// Close the session
    async fn close(&self) -> PagecheckResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod element_state_tests {
        use super::*;

        #[test]
        fn test_new_is_visible_and_enabled() {
            let el = ElementState::new("button");
            assert!(el.visible);
            assert!(el.enabled);
            assert!(el.checked.is_none());
        }

        #[test]
        fn test_classes() {
            let el = ElementState::new("li").with_class(" completed  editing ");
            assert!(el.has_class("completed"));
            assert!(el.has_class("editing"));
            assert!(!el.has_class("complete"));
        }

        #[test]
        fn test_deserialize_partial() {
            let el: ElementState =
                serde_json::from_str(r#"{"tag":"input","value":"x","visible":true}"#).unwrap();
            assert_eq!(el.value.as_deref(), Some("x"));
            assert!(!el.enabled);
        }
    }

    mod actionability_tests {
        use super::*;

        #[test]
        fn test_missing() {
            assert_eq!(Actionability::of(&[], &Action::Click), Actionability::Missing);
        }

        #[test]
        fn test_ambiguous() {
            let els = vec![ElementState::new("li"), ElementState::new("li")];
            assert_eq!(
                Actionability::of(&els, &Action::Click),
                Actionability::Ambiguous(2)
            );
        }

        #[test]
        fn test_hidden_blocks_click_not_blur() {
            let mut el = ElementState::new("input");
            el.visible = false;
            let els = [el];
            assert_eq!(Actionability::of(&els, &Action::Click), Actionability::Hidden);
            assert_eq!(Actionability::of(&els, &Action::Blur), Actionability::Ready);
        }

        #[test]
        fn test_disabled() {
            let mut el = ElementState::new("button");
            el.enabled = false;
            assert_eq!(
                Actionability::of(&[el], &Action::Fill("x".into())),
                Actionability::Disabled
            );
        }

        #[test]
        fn test_display_is_readable() {
            assert_eq!(Actionability::Ambiguous(3).to_string(), "3 elements matched");
            assert_eq!(Actionability::Missing.to_string(), "no element matched");
        }
    }

    mod action_tests {
        use super::*;

        #[test]
        fn test_names() {
            assert_eq!(Action::DoubleClick.name(), "dblclick");
            assert_eq!(Action::Press("Enter".into()).to_string(), "press(\"Enter\")");
        }

        #[test]
        fn test_json_tagging() {
            let json = serde_json::to_value(Action::Fill("milk".into())).unwrap();
            assert_eq!(json["action"], "fill");
            assert_eq!(json["arg"], "milk");
            let json = serde_json::to_value(Action::Click).unwrap();
            assert_eq!(json["action"], "click");
        }
    }
}
