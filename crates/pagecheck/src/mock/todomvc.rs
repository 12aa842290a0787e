//! Simulated TodoMVC demo application.

use super::{MockApp, MockElement};
use crate::driver::Action;
use crate::pages::Filter;
use crate::records::{TodoRecord, STORAGE_KEY};
use crate::result::{PagecheckError, PagecheckResult};
use serde::{Deserialize, Serialize};
use tracing::trace;

const ORIGIN: &str = "https://demo.playwright.dev/todomvc";
const TITLE: &str = "React • TodoMVC";

/// Stored form, as the React app writes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Todo {
    #[serde(default)]
    id: u64,
    title: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Editing {
    id: u64,
    draft: String,
}

/// TodoMVC with hash routing and `localStorage` persistence.
///
/// Writes to `localStorage` land `persist_lag` ticks after the change that
/// caused them; a reload before then loses the change, like a real page
/// reloaded before its effect ran.
#[derive(Debug, Clone)]
pub struct TodoMvcApp {
    loaded: bool,
    todos: Vec<Todo>,
    next_id: u64,
    draft: String,
    editing: Option<Editing>,
    focus: Option<String>,
    history: Vec<Filter>,
    storage: Option<String>,
    persist_lag: u32,
    pending_flush: Option<u32>,
}

impl Default for TodoMvcApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoMvcApp {
    /// Empty app with immediate persistence
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaded: false,
            todos: Vec::new(),
            next_id: 1,
            draft: String::new(),
            editing: None,
            focus: None,
            history: Vec::new(),
            storage: None,
            persist_lag: 0,
            pending_flush: None,
        }
    }

    /// Delay `localStorage` writes by `ticks` driver round-trips
    #[must_use]
    pub const fn with_persist_lag(mut self, ticks: u32) -> Self {
        self.persist_lag = ticks;
        self
    }

    /// Pre-populate `localStorage`, as left behind by an earlier visit
    #[must_use]
    pub fn with_stored(mut self, records: impl IntoIterator<Item = TodoRecord>) -> Self {
        let todos: Vec<Todo> = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Todo {
                id: i as u64 + 1,
                title: r.title,
                completed: r.completed,
            })
            .collect();
        self.storage = serde_json::to_string(&todos).ok();
        self
    }

    fn route(&self) -> Filter {
        self.history.last().copied().unwrap_or_default()
    }

    fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    fn load_from_storage(&mut self) {
        self.todos = self
            .storage
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<Todo>>(raw).ok())
            .unwrap_or_default();
        for todo in &mut self.todos {
            if todo.id == 0 {
                todo.id = self.next_id;
                self.next_id += 1;
            }
        }
        self.next_id = self.todos.iter().map(|t| t.id + 1).max().unwrap_or(1).max(self.next_id);
        self.draft.clear();
        self.editing = None;
        self.focus = None;
        self.pending_flush = None;
        self.loaded = true;
    }

    fn flush(&mut self) {
        self.storage = serde_json::to_string(&self.todos).ok();
        self.pending_flush = None;
        trace!(todos = self.todos.len(), "todomvc persisted");
    }

    fn changed(&mut self) {
        if self.persist_lag == 0 {
            self.flush();
        } else {
            self.pending_flush = Some(self.persist_lag);
        }
    }

    fn todo_mut(&mut self, id: u64) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    fn add(&mut self) {
        let title = self.draft.trim().to_string();
        self.draft.clear();
        if title.is_empty() {
            return;
        }
        self.todos.push(Todo {
            id: self.next_id,
            title,
            completed: false,
        });
        self.next_id += 1;
        self.changed();
    }

    fn set_all(&mut self, completed: bool) {
        for todo in &mut self.todos {
            todo.completed = completed;
        }
        self.changed();
    }

    fn set_completed(&mut self, id: u64, completed: Option<bool>) {
        if let Some(todo) = self.todo_mut(id) {
            todo.completed = completed.unwrap_or(!todo.completed);
            self.changed();
        }
    }

    fn begin_edit(&mut self, id: u64) {
        if let Some(todo) = self.todos.iter().find(|t| t.id == id) {
            self.editing = Some(Editing {
                id,
                draft: todo.title.clone(),
            });
            self.focus = Some(format!("edit-{id}"));
        }
    }

    fn commit_edit(&mut self) {
        let Some(Editing { id, draft }) = self.editing.take() else {
            return;
        };
        self.focus = None;
        let title = draft.trim().to_string();
        if title.is_empty() {
            self.todos.retain(|t| t.id != id);
        } else if let Some(todo) = self.todo_mut(id) {
            todo.title = title;
        }
        self.changed();
    }

    fn cancel_edit(&mut self) {
        self.editing = None;
        self.focus = None;
    }

    fn handle_key(&mut self, target: &str, key: &str) {
        match (target, key) {
            ("new-todo", "Enter") => self.add(),
            (t, "Enter") if t.starts_with("edit-") => self.commit_edit(),
            (t, "Escape") if t.starts_with("edit-") => self.cancel_edit(),
            _ => {}
        }
    }

    fn item(&self, todo: &Todo) -> MockElement {
        let editing = self.editing.as_ref().filter(|e| e.id == todo.id);
        let class = match (todo.completed, editing.is_some()) {
            (true, true) => "completed editing",
            (true, false) => "completed",
            (false, true) => "editing",
            (false, false) => "",
        };
        let id = todo.id;
        let mut li = MockElement::new("li")
            .key(&format!("item-{id}"))
            .test_id("todo-item")
            .class(class)
            .child(
                MockElement::new("div")
                    .class("view")
                    .hidden(editing.is_some())
                    .child(
                        MockElement::checkbox(&format!("toggle-{id}"), todo.completed)
                            .class("toggle")
                            .label("Toggle Todo"),
                    )
                    .child(
                        MockElement::new("label")
                            .key(&format!("title-{id}"))
                            .test_id("todo-title")
                            .text(&todo.title),
                    )
                    .child(
                        MockElement::new("button")
                            .key(&format!("destroy-{id}"))
                            .class("destroy")
                            .label("Delete"),
                    ),
            );
        if let Some(edit) = editing {
            li = li.child(
                MockElement::input(&format!("edit-{id}"), &edit.draft)
                    .class("edit")
                    .label("Edit"),
            );
        }
        li
    }

    fn footer(&self) -> MockElement {
        let active = self.todos.len() - self.completed_count();
        let noun = if active == 1 { "item" } else { "items" };
        let route = self.route();
        let filters = Filter::ALL.iter().map(|f| {
            MockElement::new("li").child(
                MockElement::new("a")
                    .key(&format!("filter-{}", f.slug()))
                    .class(if *f == route { "selected" } else { "" })
                    .text(f.label()),
            )
        });
        let mut footer = MockElement::new("footer")
            .class("footer")
            .child(
                MockElement::new("span")
                    .class("todo-count")
                    .test_id("todo-count")
                    .text(&format!("{active} {noun} left")),
            )
            .child(MockElement::new("ul").class("filters").children(filters));
        if self.completed_count() > 0 {
            footer = footer.child(
                MockElement::new("button")
                    .key("clear-completed")
                    .class("clear-completed")
                    .text("Clear completed"),
            );
        }
        footer
    }
}

impl MockApp for TodoMvcApp {
    fn navigate(&mut self, url: &str) -> PagecheckResult<()> {
        let Some(rest) = url.strip_prefix(ORIGIN) else {
            return Err(PagecheckError::navigation(
                url,
                "net::ERR_NAME_NOT_RESOLVED",
            ));
        };
        let fragment = rest.split_once('#').map_or("", |(_, f)| f);
        self.history.push(Filter::from_fragment(fragment));
        self.load_from_storage();
        Ok(())
    }

    fn reload(&mut self) {
        if self.loaded {
            self.load_from_storage();
        }
    }

    fn go_back(&mut self) {
        if self.history.len() > 1 {
            self.history.pop();
            self.cancel_edit();
        }
    }

    fn url(&self) -> String {
        if self.loaded {
            format!("{ORIGIN}/#/{}", self.route().path())
        } else {
            "about:blank".to_string()
        }
    }

    fn title(&self) -> String {
        let title = if self.loaded { TITLE } else { "" };
        title.to_string()
    }

    fn render(&self) -> MockElement {
        let body = MockElement::new("body");
        if !self.loaded {
            return body;
        }
        let header = MockElement::new("header")
            .class("header")
            .child(MockElement::new("h1").text("todos"))
            .child(
                MockElement::input("new-todo", &self.draft)
                    .class("new-todo")
                    .placeholder("What needs to be done?"),
            );
        let mut app = MockElement::new("section").class("todoapp").child(header);

        if !self.todos.is_empty() {
            let route = self.route();
            let all_done = self.completed_count() == self.todos.len();
            let items = self
                .todos
                .iter()
                .filter(|t| route.includes(t.completed))
                .map(|t| self.item(t));
            app = app
                .child(
                    MockElement::new("section")
                        .class("main")
                        .child(
                            MockElement::checkbox("toggle-all", all_done)
                                .id("toggle-all")
                                .class("toggle-all")
                                .label("Mark all as complete"),
                        )
                        .child(MockElement::new("ul").class("todo-list").children(items)),
                )
                .child(self.footer());
        }
        body.child(app)
    }

    fn act(&mut self, key: &str, action: &Action) {
        if let Some(editing) = &self.editing {
            if key != format!("edit-{}", editing.id) {
                self.commit_edit();
            }
        }

        let id_of = |prefix: &str| key.strip_prefix(prefix).and_then(|id| id.parse::<u64>().ok());

        match action {
            Action::Focus | Action::Click if key == "new-todo" => {
                self.focus = Some(key.to_string());
            }
            Action::Fill(text) if key == "new-todo" => {
                self.draft.clone_from(text);
                self.focus = Some(key.to_string());
            }
            Action::Fill(text) => {
                if let Some(editing) = self.editing.as_mut() {
                    editing.draft.clone_from(text);
                }
            }
            Action::Press(k) => self.handle_key(key, k),
            Action::Blur if key.starts_with("edit-") => self.commit_edit(),
            Action::DispatchEvent(event) if event == "blur" && key.starts_with("edit-") => {
                self.commit_edit();
            }
            Action::Check if key == "toggle-all" => self.set_all(true),
            Action::Uncheck if key == "toggle-all" => self.set_all(false),
            Action::Click if key == "toggle-all" => {
                let all_done = self.completed_count() == self.todos.len();
                self.set_all(!all_done);
            }
            Action::Click | Action::Check | Action::Uncheck if key.starts_with("toggle-") => {
                if let Some(id) = id_of("toggle-") {
                    let target = match action {
                        Action::Check => Some(true),
                        Action::Uncheck => Some(false),
                        _ => None,
                    };
                    self.set_completed(id, target);
                }
            }
            Action::DoubleClick => {
                if let Some(id) = id_of("title-").or_else(|| id_of("item-")) {
                    self.begin_edit(id);
                }
            }
            Action::Click if key.starts_with("destroy-") => {
                if let Some(id) = id_of("destroy-") {
                    self.todos.retain(|t| t.id != id);
                    self.changed();
                }
            }
            Action::Click if key.starts_with("filter-") => {
                if let Some(filter) = Filter::ALL
                    .into_iter()
                    .find(|f| key == format!("filter-{}", f.slug()))
                {
                    self.history.push(filter);
                }
            }
            Action::Click if key == "clear-completed" => {
                self.todos.retain(|t| !t.completed);
                self.changed();
            }
            _ => {}
        }
    }

    fn press_key(&mut self, key: &str) {
        if let Some(target) = self.focus.clone() {
            self.handle_key(&target, key);
        }
    }

    fn local_storage(&self, key: &str) -> Option<String> {
        (key == STORAGE_KEY).then(|| self.storage.clone()).flatten()
    }

    fn tick(&mut self) {
        match self.pending_flush {
            Some(n) if n <= 1 => self.flush(),
            Some(n) => self.pending_flush = Some(n - 1),
            None => {}
        }
    }
}
