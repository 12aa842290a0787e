//! Auto-retrying expectations.
//!
//! `expect(&locator).to_have_text("...")` re-resolves the locator on every
//! poll until the expectation holds or the expect timeout passes. A timeout
//! reports the expectation and the last value observed.
//!
//! ```ignore
//! expect(&todo.todo_count).to_have_text("3 items left").await?;
//! expect(&docs.search_input).not().to_be_visible().await?;
//! expect_page(todo.page()).to_have_url(&Filter::Active.url()).await?;
//! ```

use crate::driver::ElementState;
use crate::locator::{normalize_whitespace, Locator, TextMatch};
use crate::page::Page;
use crate::result::{PagecheckError, PagecheckResult};
use crate::snapshot::{ScreenshotStore, SnapshotCheck};
use crate::wait::{poll_until, Sampled, WaitOptions};
use tracing::{debug, warn};

/// Verdict of one evaluation: whether the condition held, and what was seen
type Verdict = (bool, String);

/// Expectations on a locator
#[derive(Debug, Clone)]
#[must_use = "expectations do nothing until awaited"]
pub struct LocatorExpect {
    locator: Locator,
    negate: bool,
    wait: WaitOptions,
}

/// Start an expectation on `locator`
pub fn expect(locator: &Locator) -> LocatorExpect {
    LocatorExpect {
        wait: locator.page().options().expect_wait(),
        locator: locator.clone(),
        negate: false,
    }
}

fn describe_texts(elements: &[ElementState]) -> String {
    let texts: Vec<String> = elements
        .iter()
        .map(|e| normalize_whitespace(&e.text))
        .collect();
    format!("{texts:?}")
}

impl LocatorExpect {
    /// Invert the expectation
    pub fn not(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Override the expect timeout
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait = self.wait.with_timeout(timeout_ms);
        self
    }

    async fn check<F>(&self, expectation: String, strict: bool, eval: F) -> PagecheckResult<()>
    where
        F: Fn(&[ElementState]) -> Verdict,
    {
        let expectation = if self.negate {
            format!("not.{expectation}")
        } else {
            expectation
        };
        let locator = &self.locator;
        let negate = self.negate;
        let eval = &eval;
        let target = locator.to_string();

        locator
            .page()
            .traced("expect", format!("{target} {expectation}"), async {
                let outcome = poll_until(&self.wait, move || async move {
                    let elements = locator.all().await?;
                    if strict && elements.len() > 1 {
                        return Err(PagecheckError::StrictModeViolation {
                            action: "expect".to_string(),
                            locator: locator.to_string(),
                            count: elements.len(),
                        });
                    }
                    let (held, observed) = eval(&elements);
                    Ok(if held != negate {
                        Sampled::Done(())
                    } else {
                        Sampled::Pending(observed)
                    })
                })
                .await?;

                match outcome {
                    Ok(_) => {
                        debug!(locator = %target, expectation = %expectation, "expectation met");
                        Ok(())
                    }
                    Err(expired) => {
                        warn!(locator = %target, expectation = %expectation, last = %expired.last, "expectation timed out");
                        Err(PagecheckError::AssertionTimeout {
                            target: target.clone(),
                            expectation: expectation.clone(),
                            timeout_ms: self.wait.timeout_ms,
                            last_observed: expired.last,
                        })
                    }
                }
            })
            .await
    }

    /// Exactly one match, and it is visible
    pub async fn to_be_visible(&self) -> PagecheckResult<()> {
        self.check("to_be_visible()".into(), true, |els| match els {
            [el] => (el.visible, if el.visible { "visible" } else { "hidden" }.into()),
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// No match, or the single match is not visible
    pub async fn to_be_hidden(&self) -> PagecheckResult<()> {
        self.check("to_be_hidden()".into(), true, |els| match els {
            [] => (true, "no element matched".into()),
            [el] => (!el.visible, if el.visible { "visible" } else { "hidden" }.into()),
            _ => (false, format!("{} elements matched", els.len())),
        })
        .await
    }

    /// The single match is enabled
    pub async fn to_be_enabled(&self) -> PagecheckResult<()> {
        self.check("to_be_enabled()".into(), true, |els| match els {
            [el] => (el.enabled, if el.enabled { "enabled" } else { "disabled" }.into()),
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// The single match is a checked checkbox
    pub async fn to_be_checked(&self) -> PagecheckResult<()> {
        self.check("to_be_checked()".into(), true, |els| match els {
            [el] => {
                let checked = el.checked.unwrap_or(false);
                (checked, if checked { "checked" } else { "unchecked" }.into())
            }
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// The single match is an empty input (or has no text)
    pub async fn to_be_empty(&self) -> PagecheckResult<()> {
        self.check("to_be_empty()".into(), true, |els| match els {
            [el] => {
                let content = el.value.clone().unwrap_or_else(|| el.text.clone());
                (content.trim().is_empty(), format!("{content:?}"))
            }
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// The single match's whole text equals `expected` (whitespace-normalized)
    pub async fn to_have_text(&self, expected: &str) -> PagecheckResult<()> {
        self.to_match_text(TextMatch::exact(expected)).await
    }

    /// The single match's text satisfies `matcher`
    pub async fn to_match_text(&self, matcher: TextMatch) -> PagecheckResult<()> {
        self.check(format!("to_have_text({matcher})"), true, |els| match els {
            [el] => (matcher.matches(&el.text), describe_texts(els)),
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// The single match's text contains `expected` (case-sensitive)
    pub async fn to_contain_text(&self, expected: &str) -> PagecheckResult<()> {
        let needle = normalize_whitespace(expected);
        self.check(format!("to_contain_text({expected:?})"), true, |els| match els {
            [el] => (normalize_whitespace(&el.text).contains(&needle), describe_texts(els)),
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// The matches' texts equal `expected`, in order
    pub async fn to_have_texts(&self, expected: &[&str]) -> PagecheckResult<()> {
        let expected: Vec<String> = expected.iter().map(|t| normalize_whitespace(t)).collect();
        self.check(format!("to_have_texts({expected:?})"), false, |els| {
            let actual: Vec<String> = els.iter().map(|e| normalize_whitespace(&e.text)).collect();
            (actual == expected, format!("{actual:?}"))
        })
        .await
    }

    /// The single match's `class` attribute equals `expected`
    pub async fn to_have_class(&self, expected: &str) -> PagecheckResult<()> {
        let expected = normalize_whitespace(expected);
        self.check(format!("to_have_class({expected:?})"), true, |els| match els {
            [el] => {
                let actual = normalize_whitespace(&el.class);
                (actual == expected, format!("{actual:?}"))
            }
            _ => (false, "no element matched".into()),
        })
        .await
    }

    /// The matches' `class` attributes equal `expected`, in order
    pub async fn to_have_classes(&self, expected: &[&str]) -> PagecheckResult<()> {
        let expected: Vec<String> = expected.iter().map(|c| normalize_whitespace(c)).collect();
        self.check(format!("to_have_classes({expected:?})"), false, |els| {
            let actual: Vec<String> = els.iter().map(|e| normalize_whitespace(&e.class)).collect();
            (actual == expected, format!("{actual:?}"))
        })
        .await
    }

    /// Exactly `expected` matches
    pub async fn to_have_count(&self, expected: usize) -> PagecheckResult<()> {
        self.check(format!("to_have_count({expected})"), false, |els| {
            (els.len() == expected, els.len().to_string())
        })
        .await
    }

    /// The single match's input value equals `expected`
    pub async fn to_have_value(&self, expected: &str) -> PagecheckResult<()> {
        self.check(format!("to_have_value({expected:?})"), true, |els| match els {
            [el] => {
                let actual = el.value.clone().unwrap_or_default();
                (actual == expected, format!("{actual:?}"))
            }
            _ => (false, "no element matched".into()),
        })
        .await
    }
}

// =============================================================================
// PAGE EXPECTATIONS
// =============================================================================

/// Expectations on a whole page
#[derive(Debug, Clone)]
#[must_use = "expectations do nothing until awaited"]
pub struct PageExpect {
    page: Page,
    negate: bool,
    wait: WaitOptions,
}

/// Start an expectation on `page`
pub fn expect_page(page: &Page) -> PageExpect {
    PageExpect {
        wait: page.options().expect_wait(),
        page: page.clone(),
        negate: false,
    }
}

impl PageExpect {
    /// Invert the expectation
    pub fn not(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Override the expect timeout
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait = self.wait.with_timeout(timeout_ms);
        self
    }

    async fn check_string(
        &self,
        what: &'static str,
        matcher: TextMatch,
        title: bool,
    ) -> PagecheckResult<()> {
        let expectation = format!(
            "{}to_have_{what}({matcher})",
            if self.negate { "not." } else { "" }
        );
        let page = &self.page;
        let negate = self.negate;
        let matcher = &matcher;

        page.traced("expect", expectation.clone(), async {
            let outcome = poll_until(&self.wait, move || async move {
                let actual = if title { page.title().await? } else { page.url().await? };
                Ok(if matcher.matches(&actual) != negate {
                    Sampled::Done(())
                } else {
                    Sampled::Pending(format!("{actual:?}"))
                })
            })
            .await?;

            outcome.map(|_| ()).map_err(|expired| {
                warn!(expectation = %expectation, last = %expired.last, "page expectation timed out");
                PagecheckError::AssertionTimeout {
                    target: "page".to_string(),
                    expectation: expectation.clone(),
                    timeout_ms: self.wait.timeout_ms,
                    last_observed: expired.last,
                }
            })
        })
        .await
    }

    /// Title equals `expected`
    pub async fn to_have_title(&self, expected: &str) -> PagecheckResult<()> {
        self.check_string("title", TextMatch::exact(expected), true)
            .await
    }

    /// Title satisfies `matcher`
    pub async fn to_match_title(&self, matcher: TextMatch) -> PagecheckResult<()> {
        self.check_string("title", matcher, true).await
    }

    /// URL equals `expected`
    pub async fn to_have_url(&self, expected: &str) -> PagecheckResult<()> {
        self.check_string("url", TextMatch::exact(expected), false)
            .await
    }

    /// URL satisfies `matcher`
    pub async fn to_match_url(&self, matcher: TextMatch) -> PagecheckResult<()> {
        self.check_string("url", matcher, false).await
    }

    /// Viewport capture matches the stored baseline `name`.
    ///
    /// Captures are retried until the expect timeout while they differ; a
    /// final mismatch writes the actual capture next to the run's artifacts.
    pub async fn to_have_screenshot(
        &self,
        store: &ScreenshotStore,
        name: &str,
    ) -> PagecheckResult<SnapshotCheck> {
        let page = &self.page;
        page.traced("expect", format!("to_have_screenshot({name:?})"), async {
            let outcome = poll_until(&self.wait, move || async move {
                let bytes = page.screenshot().await?;
                Ok(match store.check(name, &bytes)? {
                    SnapshotCheck::Mismatch => Sampled::Pending(bytes),
                    settled => Sampled::Done(settled),
                })
            })
            .await?;

            match outcome {
                Ok(polled) => Ok(polled.value),
                Err(expired) => Err(store.reject(name, &expired.last)),
            }
        })
        .await
    }
}
