//! Output formatting

use console::{style, Term};
use pagecheck::{RecordSet, TodoRecord};

/// Status line printer on stderr; results go to stdout
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn line(&self, symbol: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("✓", "PASS", |s| style(s).green().bold().to_string(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line("✗", "FAIL", |s| style(s).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("⚠", "WARN", |s| style(s).yellow().bold().to_string(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("ℹ", "INFO", |s| style(s).blue().bold().to_string(), message);
    }
}

/// One line per record: `[x] title` or `[ ] title`
#[must_use]
pub fn format_record(record: &TodoRecord) -> String {
    let mark = if record.completed { 'x' } else { ' ' };
    format!("[{mark}] {}", record.title)
}

/// Records followed by a count summary
#[must_use]
pub fn render_records(set: &RecordSet) -> String {
    let mut out = String::new();
    for record in set.records() {
        out.push_str(&format_record(record));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} record(s), {} completed\n",
        set.len(),
        set.completed_count()
    ));
    out
}
