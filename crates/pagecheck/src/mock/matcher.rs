//! Selector resolution over a [`MockElement`] tree.
//!
//! Mirrors the in-page resolver used by the CDP driver: search steps look at
//! descendants of the current matches, filter steps narrow the match list,
//! role lookups skip hidden elements, text lookups return the innermost
//! matching elements. CSS support is limited to compound selectors
//! (`tag.class#id[attr="value"]`, comma-separated).

use super::element::MockElement;
use crate::locator::{Selector, SelectorStep};

/// A matched element with its computed visibility
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// Matched node
    pub element: &'a MockElement,
    /// Neither it nor any ancestor is hidden
    pub visible: bool,
}

/// Resolve `selector` against the document rooted at `root`
#[must_use]
pub fn resolve<'a>(root: &'a MockElement, selector: &Selector) -> Vec<Resolved<'a>> {
    let mut current = vec![Resolved {
        element: root,
        visible: !root.hidden,
    }];

    for step in selector.steps() {
        current = if step.is_filter() {
            filter(current, step)
        } else {
            search(&current, step)
        };
    }
    current
}

fn filter<'a>(current: Vec<Resolved<'a>>, step: &SelectorStep) -> Vec<Resolved<'a>> {
    match step {
        SelectorStep::HasText { text } => current
            .into_iter()
            .filter(|r| text.matches(&r.element.text_content()))
            .collect(),
        SelectorStep::Nth { index } => current.into_iter().nth(*index).into_iter().collect(),
        SelectorStep::First => current.into_iter().take(1).collect(),
        SelectorStep::Last => current.into_iter().last().into_iter().collect(),
        _ => current,
    }
}

fn search<'a>(scopes: &[Resolved<'a>], step: &SelectorStep) -> Vec<Resolved<'a>> {
    let mut found: Vec<Resolved<'a>> = Vec::new();
    for scope in scopes {
        let mut descendants = Vec::new();
        for child in &scope.element.children {
            walk(child, scope.visible, &mut descendants);
        }
        for candidate in descendants {
            if step_matches(&candidate, step)
                && !found
                    .iter()
                    .any(|f| std::ptr::eq(f.element, candidate.element))
            {
                found.push(candidate);
            }
        }
    }
    found
}

fn walk<'a>(element: &'a MockElement, parent_visible: bool, out: &mut Vec<Resolved<'a>>) {
    let visible = parent_visible && !element.hidden;
    out.push(Resolved { element, visible });
    for child in &element.children {
        walk(child, visible, out);
    }
}

fn step_matches(candidate: &Resolved<'_>, step: &SelectorStep) -> bool {
    let el = candidate.element;
    match step {
        SelectorStep::Role { role, name } => {
            candidate.visible
                && el.effective_role() == Some(*role)
                && name
                    .as_ref()
                    .map_or(true, |n| n.matches(&el.accessible_name()))
        }
        SelectorStep::Label { text } => el.label.as_deref().is_some_and(|l| text.matches(l)),
        SelectorStep::Placeholder { text } => el
            .placeholder
            .as_deref()
            .is_some_and(|p| text.matches(p)),
        SelectorStep::Text { text } => {
            text.matches(&el.text_content())
                && !el
                    .children
                    .iter()
                    .any(|c| text.matches(&c.text_content()))
        }
        SelectorStep::TestId { id } => el.test_id.as_deref() == Some(id.as_str()),
        SelectorStep::Css { css } => css
            .split(',')
            .any(|part| compound_matches(el, part.trim())),
        SelectorStep::HasText { .. }
        | SelectorStep::Nth { .. }
        | SelectorStep::First
        | SelectorStep::Last => false,
    }
}

fn attribute(el: &MockElement, name: &str) -> Option<String> {
    match name {
        "data-testid" => el.test_id.clone(),
        "placeholder" => el.placeholder.clone(),
        "aria-label" => el.label.clone(),
        "type" => el.input_type.clone(),
        "id" => el.id.clone(),
        "value" => el.value.clone(),
        "class" => (!el.class.is_empty()).then(|| el.class.clone()),
        _ => None,
    }
}

fn is_boundary(c: char) -> bool {
    matches!(c, '.' | '#' | '[')
}

fn compound_matches(el: &MockElement, selector: &str) -> bool {
    if selector.is_empty() {
        return false;
    }
    let tag_end = selector.find(is_boundary).unwrap_or(selector.len());
    let tag = &selector[..tag_end];
    if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&el.tag) {
        return false;
    }

    let mut rest = &selector[tag_end..];
    while let Some(kind) = rest.chars().next() {
        rest = &rest[kind.len_utf8()..];
        match kind {
            '.' | '#' => {
                let end = rest.find(is_boundary).unwrap_or(rest.len());
                let name = &rest[..end];
                rest = &rest[end..];
                let ok = if kind == '.' {
                    el.class.split_whitespace().any(|c| c == name)
                } else {
                    el.id.as_deref() == Some(name)
                };
                if !ok {
                    return false;
                }
            }
            '[' => {
                let Some(end) = rest.find(']') else {
                    return false;
                };
                let attr = &rest[..end];
                rest = &rest[end + 1..];
                let (name, expected) = match attr.split_once('=') {
                    Some((n, v)) => (n.trim(), Some(v.trim().trim_matches(['"', '\'']))),
                    None => (attr.trim(), None),
                };
                match (attribute(el, name), expected) {
                    (None, _) => return false,
                    (Some(actual), Some(expected)) if actual != expected => return false,
                    _ => {}
                }
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::{Role, TextMatch};

    fn list() -> MockElement {
        MockElement::new("body").child(
            MockElement::new("ul").class("todo-list").children([
                MockElement::new("li")
                    .test_id("todo-item")
                    .class("completed")
                    .child(MockElement::checkbox("t1", true).label("Toggle Todo"))
                    .child(MockElement::new("label").test_id("todo-title").text("buy milk")),
                MockElement::new("li")
                    .test_id("todo-item")
                    .child(MockElement::checkbox("t2", false).label("Toggle Todo").hidden(true))
                    .child(MockElement::new("label").test_id("todo-title").text("feed cat")),
            ]),
        )
    }

    fn keys(found: &[Resolved<'_>]) -> Vec<String> {
        found.iter().map(|r| r.element.key.clone()).collect()
    }

    #[test]
    fn test_test_id_and_nth() {
        let root = list();
        let found = resolve(&root, &Selector::test_id("todo-item"));
        assert_eq!(found.len(), 2);
        let second = resolve(
            &root,
            &Selector::test_id("todo-item").then(SelectorStep::Nth { index: 1 }),
        );
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].element.class, "");
        let none = resolve(
            &root,
            &Selector::test_id("todo-item").then(SelectorStep::Nth { index: 5 }),
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_scoped_role_skips_hidden() {
        let root = list();
        let all = resolve(&root, &Selector::role(Role::Checkbox));
        assert_eq!(keys(&all), vec!["t1"]);
        let second = Selector::test_id("todo-item")
            .then(SelectorStep::Last)
            .then(SelectorStep::Role {
                role: Role::Checkbox,
                name: None,
            });
        assert!(resolve(&root, &second).is_empty());
    }

    #[test]
    fn test_label_ignores_visibility() {
        let root = list();
        let found = resolve(&root, &Selector::label("Toggle Todo"));
        assert_eq!(keys(&found), vec!["t1", "t2"]);
        assert!(found[0].visible);
        assert!(!found[1].visible);
    }

    #[test]
    fn test_text_returns_innermost() {
        let root = list();
        let found = resolve(&root, &Selector::text("feed"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element.tag, "label");
    }

    #[test]
    fn test_has_text_filter() {
        let root = list();
        let found = resolve(
            &root,
            &Selector::test_id("todo-item").then(SelectorStep::HasText {
                text: TextMatch::substring("MILK"),
            }),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element.class, "completed");
    }

    #[test]
    fn test_css_compound() {
        let root = list();
        assert_eq!(resolve(&root, &Selector::css("ul.todo-list")).len(), 1);
        assert_eq!(resolve(&root, &Selector::css("li.completed")).len(), 1);
        assert_eq!(
            resolve(&root, &Selector::css("[data-testid=\"todo-title\"]")).len(),
            2
        );
        assert_eq!(resolve(&root, &Selector::css("input[type=checkbox]")).len(), 2);
        assert_eq!(resolve(&root, &Selector::css("li, label")).len(), 4);
        assert!(resolve(&root, &Selector::css("section")).is_empty());
    }

    #[test]
    fn test_css_non_ascii_after_attribute() {
        let root = list();
        assert!(resolve(&root, &Selector::css("[data-testid=todo-item]é")).is_empty());
        assert!(resolve(&root, &Selector::css("li[data-testid=todo-item]→.completed")).is_empty());
        assert_eq!(
            resolve(&root, &Selector::css("li[data-testid=todo-item].completed")).len(),
            1
        );
        assert!(resolve(&root, &Selector::css("li.café")).is_empty());
    }

    #[test]
    fn test_css_scoped() {
        let root = list();
        let found = resolve(
            &root,
            &Selector::css("li.completed").then(SelectorStep::Css { css: "label".into() }),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element.text, "buy milk");
    }
}
