//! Persisted record set.
//!
//! The TodoMVC application stores its list as a JSON array under one
//! `localStorage` key. Each entry carries at least a title and a completion
//! flag; other fields (ids, timestamps) are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage key the TodoMVC application persists to
pub const STORAGE_KEY: &str = "react-todos";

/// One persisted todo
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoRecord {
    /// Title as stored (already trimmed by the application)
    pub title: String,
    /// Completion flag
    pub completed: bool,
}

impl TodoRecord {
    /// Active record
    #[must_use]
    pub fn active(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }

    /// Completed record
    #[must_use]
    pub fn completed(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: true,
        }
    }
}

/// Parsed snapshot of the persisted list, in storage order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<TodoRecord>,
}

impl RecordSet {
    /// Wrap a list of records
    #[must_use]
    pub fn new(records: Vec<TodoRecord>) -> Self {
        Self { records }
    }

    /// Parse the raw storage value
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize back to the storage format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Total number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of completed records
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.records.iter().filter(|r| r.completed).count()
    }

    /// Number of active records
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.len() - self.completed_count()
    }

    /// Whether some record has exactly this title
    #[must_use]
    pub fn contains_title(&self, title: &str) -> bool {
        self.records.iter().any(|r| r.title == title)
    }

    /// Titles in storage order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.title.as_str())
    }

    /// Records in storage order
    #[must_use]
    pub fn records(&self) -> &[TodoRecord] {
        &self.records
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records ({} completed): [",
            self.len(),
            self.completed_count()
        )?;
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let mark = if record.completed { "x" } else { " " };
            write!(f, "[{mark}] {:?}", record.title)?;
        }
        f.write_str("]")
    }
}

impl FromIterator<TodoRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = TodoRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a TodoRecord;
    type IntoIter = std::slice::Iter<'a, TodoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
