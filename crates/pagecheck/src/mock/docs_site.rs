//! Simulated documentation site: home page, docs intro, search modal.

use super::{MockApp, MockElement};
use crate::driver::Action;
use crate::locator::Role;
use crate::result::{PagecheckError, PagecheckResult};
use chrono::{Datelike, Utc};

const ORIGIN: &str = "https://playwright.dev";
const HOME_TITLE: &str = "Fast and reliable end-to-end testing for modern web apps | Playwright";
const INTRO_TITLE: &str = "Installation | Playwright";

/// Colour mode toggled by the navbar button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ColorMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ColorMode {
    const fn next(self) -> Self {
        match self {
            Self::System => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// playwright.dev, reduced to what the checks touch
#[derive(Debug, Clone, Default)]
pub struct DocsSiteApp {
    history: Vec<String>,
    mode: ColorMode,
    search_open: bool,
    query: String,
    focus: Option<String>,
}

impl DocsSiteApp {
    /// Fresh tab, nothing loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    fn open(&mut self, path: &str) {
        self.history.push(path.to_string());
        self.close_search();
    }

    fn close_search(&mut self) {
        self.search_open = false;
        self.query.clear();
        self.focus = None;
    }

    fn navbar(&self) -> MockElement {
        MockElement::new("nav")
            .class("navbar")
            .child(
                MockElement::new("a")
                    .key("nav-docs")
                    .class("navbar__link")
                    .text("Docs"),
            )
            .child(MockElement::new("a").key("nav-api").class("navbar__link").text("API"))
            .child(
                MockElement::new("button")
                    .key("mode-toggle")
                    .class("clean-btn toggleButton")
                    .label(&format!(
                        "Switch between dark and light mode (currently {} mode)",
                        self.mode.as_str()
                    )),
            )
            .child(
                MockElement::new("button")
                    .key("search")
                    .class("DocSearch DocSearch-Button")
                    .label("Search")
                    .text("Search ⌘K"),
            )
    }

    fn search_modal(&self) -> MockElement {
        MockElement::new("div")
            .key("search-modal")
            .class("DocSearch-Modal")
            .role(Role::Dialog)
            .child(
                MockElement::input("search-input", &self.query)
                    .class("DocSearch-Input")
                    .input_type("search")
                    .placeholder("Search docs"),
            )
    }
}

impl MockApp for DocsSiteApp {
    fn navigate(&mut self, url: &str) -> PagecheckResult<()> {
        let Some(rest) = url.strip_prefix(ORIGIN) else {
            return Err(PagecheckError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"));
        };
        let path = match rest.trim_end_matches('/') {
            "" => "/",
            other if other.starts_with('/') => other,
            _ => return Err(PagecheckError::navigation(url, "net::ERR_NAME_NOT_RESOLVED")),
        };
        self.open(path);
        Ok(())
    }

    fn reload(&mut self) {
        self.close_search();
    }

    fn go_back(&mut self) {
        if self.history.len() > 1 {
            self.history.pop();
            self.close_search();
        }
    }

    fn url(&self) -> String {
        match self.path() {
            Some("/") => format!("{ORIGIN}/"),
            Some(path) => format!("{ORIGIN}{path}"),
            None => "about:blank".to_string(),
        }
    }

    fn title(&self) -> String {
        match self.path() {
            Some("/") => HOME_TITLE.to_string(),
            Some("/docs/intro") => INTRO_TITLE.to_string(),
            Some(_) => "Page Not Found | Playwright".to_string(),
            None => String::new(),
        }
    }

    fn render(&self) -> MockElement {
        let body = MockElement::new("body");
        let Some(path) = self.path() else {
            return body;
        };
        let heading = match path {
            "/" => "Playwright enables reliable end-to-end testing for modern web apps.",
            "/docs/intro" => "Installation",
            _ => "Page Not Found",
        };
        let mut body = body
            .child(self.navbar())
            .child(MockElement::new("main").child(MockElement::new("h1").text(heading)))
            .child(
                MockElement::new("footer").class("footer").child(
                    MockElement::new("div")
                        .class("footer__copyright")
                        .text(&format!("Copyright © {} Microsoft", Utc::now().year())),
                ),
            );
        if self.search_open {
            body = body.child(self.search_modal());
        }
        body
    }

    fn act(&mut self, key: &str, action: &Action) {
        match (key, action) {
            ("nav-docs", Action::Click) => self.open("/docs/intro"),
            ("nav-api", Action::Click) => self.open("/docs/api/class-playwright"),
            ("mode-toggle", Action::Click) => self.mode = self.mode.next(),
            ("search", Action::Click) => {
                self.search_open = true;
                self.focus = Some("search-input".to_string());
            }
            ("search-input", Action::Fill(text)) => self.query.clone_from(text),
            ("search-input", Action::Focus | Action::Click) => {
                self.focus = Some(key.to_string());
            }
            ("search-input", Action::Press(k)) if k == "Escape" => self.close_search(),
            _ => {}
        }
    }

    fn press_key(&mut self, key: &str) {
        if key == "Escape" && self.search_open {
            self.close_search();
        }
    }

    fn local_storage(&self, key: &str) -> Option<String> {
        (key == "theme" && self.mode != ColorMode::System).then(|| self.mode.as_str().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::matcher::resolve;

    fn home() -> DocsSiteApp {
        let mut app = DocsSiteApp::new();
        app.navigate("https://playwright.dev").unwrap();
        app
    }

    #[test]
    fn test_home_title_and_url() {
        let app = home();
        assert_eq!(app.url(), "https://playwright.dev/");
        assert_eq!(app.title(), HOME_TITLE);
    }

    #[test]
    fn test_foreign_host_fails() {
        let err = DocsSiteApp::new().navigate("https://playwright.dev.invalid").unwrap_err();
        assert!(matches!(err, PagecheckError::Navigation { .. }));
    }

    #[test]
    fn test_search_modal_opens_and_closes() {
        let mut app = home();
        let input = Selector::placeholder("search docs");
        assert!(resolve(&app.render(), &input).is_empty());
        app.act("search", &Action::Click);
        assert_eq!(resolve(&app.render(), &input).len(), 1);
        app.press_key("Escape");
        assert!(resolve(&app.render(), &input).is_empty());
    }

    #[test]
    fn test_docs_link_and_back() {
        let mut app = home();
        app.act("nav-docs", &Action::Click);
        assert_eq!(app.url(), "https://playwright.dev/docs/intro");
        assert_eq!(app.title(), INTRO_TITLE);
        app.go_back();
        assert_eq!(app.url(), "https://playwright.dev/");
    }

    #[test]
    fn test_mode_button_cycles() {
        let mut app = home();
        let button = Selector::label("Switch between dark and light");
        assert_eq!(resolve(&app.render(), &button).len(), 1);
        app.act("mode-toggle", &Action::Click);
        assert_eq!(app.local_storage("theme").as_deref(), Some("light"));
        let root = app.render();
        let found = resolve(&root, &button);
        assert!(found[0].element.accessible_name().contains("currently light"));
    }

    #[test]
    fn test_copyright_has_current_year() {
        let app = home();
        let root = app.render();
        let found = resolve(&root, &Selector::text(crate::locator::TextMatch::pattern("Copyright")));
        assert_eq!(found.len(), 1);
        assert!(found[0]
            .element
            .text_content()
            .contains(&Utc::now().year().to_string()));
    }
}
