//! Rendered element tree for the in-memory driver.

use crate::driver::ElementState;
use crate::locator::{normalize_whitespace, Role};

/// One node of a rendered mock document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Stable key the app uses to route actions
    pub key: String,
    /// Lowercase tag name
    pub tag: String,
    /// Explicit ARIA role (overrides the implicit one)
    pub role: Option<Role>,
    /// `aria-label` or associated `<label>` text
    pub label: Option<String>,
    /// `placeholder` attribute
    pub placeholder: Option<String>,
    /// `data-testid` attribute
    pub test_id: Option<String>,
    /// `id` attribute
    pub id: Option<String>,
    /// `type` attribute of inputs
    pub input_type: Option<String>,
    /// Own text, rendered before the children
    pub text: String,
    /// `class` attribute
    pub class: String,
    /// Form control value
    pub value: Option<String>,
    /// Checked state
    pub checked: Option<bool>,
    /// `display: none`
    pub hidden: bool,
    /// `disabled` attribute
    pub disabled: bool,
    /// Child nodes
    pub children: Vec<MockElement>,
}

impl MockElement {
    /// Element with a tag
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Text input
    #[must_use]
    pub fn input(key: &str, value: &str) -> Self {
        Self::new("input").key(key).value(value)
    }

    /// Checkbox input
    #[must_use]
    pub fn checkbox(key: &str, checked: bool) -> Self {
        let mut el = Self::new("input").key(key);
        el.input_type = Some("checkbox".to_string());
        el.checked = Some(checked);
        el
    }

    /// Set the routing key
    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    /// Set an explicit role
    #[must_use]
    pub const fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the label
    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Set the placeholder
    #[must_use]
    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// Set the test id
    #[must_use]
    pub fn test_id(mut self, id: &str) -> Self {
        self.test_id = Some(id.to_string());
        self
    }

    /// Set the id attribute
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Set the input type
    #[must_use]
    pub fn input_type(mut self, input_type: &str) -> Self {
        self.input_type = Some(input_type.to_string());
        self
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Set the class attribute
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    /// Set the value
    #[must_use]
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Hide the element (and its subtree)
    #[must_use]
    pub const fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// `textContent`: own text followed by every descendant's
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            let text = child.text_content();
            if text.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&text);
        }
        out
    }

    /// Explicit role, else the role implied by the tag
    #[must_use]
    pub fn effective_role(&self) -> Option<Role> {
        if self.role.is_some() {
            return self.role;
        }
        match self.tag.as_str() {
            "a" => Some(Role::Link),
            "button" => Some(Role::Button),
            "li" => Some(Role::ListItem),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(Role::Heading),
            "textarea" => Some(Role::Textbox),
            "input" => match self.input_type.as_deref() {
                Some("checkbox") => Some(Role::Checkbox),
                Some("search") => Some(Role::Searchbox),
                Some("button" | "submit" | "reset") => Some(Role::Button),
                _ => Some(Role::Textbox),
            },
            _ => None,
        }
    }

    /// Accessible name: label if present, else text content
    #[must_use]
    pub fn accessible_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| normalize_whitespace(&self.text_content()))
    }

    /// Snapshot for the driver seam
    #[must_use]
    pub fn state(&self, visible: bool) -> ElementState {
        ElementState {
            tag: self.tag.clone(),
            text: self.text_content(),
            value: self.value.clone(),
            class: self.class.clone(),
            visible,
            enabled: !self.disabled,
            checked: self.checked,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_joins_descendants() {
        let el = MockElement::new("footer")
            .text("Copyright")
            .child(MockElement::new("span").text("2026"))
            .child(MockElement::new("span").text("Microsoft"));
        assert_eq!(el.text_content(), "Copyright 2026 Microsoft");
    }

    #[test]
    fn test_implicit_roles() {
        assert_eq!(MockElement::new("a").effective_role(), Some(Role::Link));
        assert_eq!(
            MockElement::checkbox("t", false).effective_role(),
            Some(Role::Checkbox)
        );
        assert_eq!(
            MockElement::input("q", "").input_type("search").effective_role(),
            Some(Role::Searchbox)
        );
        assert_eq!(MockElement::new("div").effective_role(), None);
        assert_eq!(
            MockElement::new("div").role(Role::Dialog).effective_role(),
            Some(Role::Dialog)
        );
    }

    #[test]
    fn test_accessible_name_prefers_label() {
        let button = MockElement::new("button").label("Search").text("Search ⌘K");
        assert_eq!(button.accessible_name(), "Search");
        let link = MockElement::new("a").text("  Docs ");
        assert_eq!(link.accessible_name(), "Docs");
    }

    #[test]
    fn test_state_reflects_disabled() {
        let mut el = MockElement::new("button");
        el.disabled = true;
        let state = el.state(true);
        assert!(!state.enabled);
        assert!(state.visible);
    }
}
