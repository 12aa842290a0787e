//! Handlers that open a live page: records, converge, screenshot
//!
//! The page-level helpers take any [`Page`], so they run the same against
//! Chromium and the in-memory driver.

use crate::commands::{ConvergeArgs, OutputArg, RecordsArgs, ScreenshotArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render_records, Reporter};
use pagecheck::{
    Convergence, ConvergencePoller, Observed, Page, RecordPredicate, RunConfig, ScreenshotStore,
    SnapshotCheck, UpdateMode,
};
use std::future::Future;
use tracing::debug;

/// Reject anything that is not an absolute http(s) URL
pub fn validate_url(url: &str) -> CliResult<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(CliError::invalid_argument(format!(
            "'{url}' is not an http(s) URL"
        ))),
    }
}

/// Predicate selected by `--count`, `--completed` or `--contains`
pub fn predicate_from_args(args: &ConvergeArgs) -> CliResult<RecordPredicate> {
    match (args.count, args.completed, &args.contains) {
        (Some(n), None, None) => Ok(RecordPredicate::count(n)),
        (None, Some(n), None) => Ok(RecordPredicate::completed_count(n)),
        (None, None, Some(title)) => Ok(RecordPredicate::contains_title(title.clone())),
        _ => Err(CliError::invalid_argument(
            "pass exactly one of --count, --completed or --contains",
        )),
    }
}

/// Single sample of `key`
pub async fn read_records(page: &Page, key: &str) -> CliResult<Observed> {
    Ok(ConvergencePoller::new(page.clone())
        .with_key(key)
        .snapshot()
        .await?)
}

/// Poll `key` until `predicate` holds
pub async fn converge(
    page: &Page,
    predicate: RecordPredicate,
    key: &str,
    timeout_ms: Option<u64>,
) -> CliResult<Convergence> {
    let mut poller = ConvergencePoller::new(page.clone()).with_key(key);
    if let Some(ms) = timeout_ms {
        poller = poller.with_timeout(ms);
    }
    Ok(poller.wait_for(predicate).await?)
}

/// Capture the page and compare it with baseline `name`
pub async fn check_screenshot(
    page: &Page,
    store: &ScreenshotStore,
    name: &str,
) -> CliResult<SnapshotCheck> {
    let actual = page.screenshot().await?;
    match store.check(name, &actual)? {
        SnapshotCheck::Mismatch => Err(store.reject(name, &actual).into()),
        other => Ok(other),
    }
}

/// Execute the records command
pub async fn execute_records(
    config: &CliConfig,
    args: &RecordsArgs,
    reporter: &Reporter,
) -> CliResult<()> {
    validate_url(&args.url)?;
    let observed = with_live_page(&config.run, &args.url, "records", |page| async move {
        read_records(&page, &args.key).await
    })
    .await?;

    match observed {
        Observed::Absent => {
            reporter.warning(&format!("nothing stored under '{}'", args.key));
            if args.format == OutputArg::Json {
                println!("null");
            }
            Ok(())
        }
        Observed::Malformed { reason, .. } => Err(CliError::MalformedRecords {
            key: args.key.clone(),
            reason,
        }),
        Observed::Parsed(set) => {
            match args.format {
                OutputArg::Text => print!("{}", render_records(&set)),
                OutputArg::Json => println!("{}", serde_json::to_string_pretty(&set)?),
            }
            Ok(())
        }
    }
}

/// Execute the converge command
pub async fn execute_converge(
    config: &CliConfig,
    args: &ConvergeArgs,
    reporter: &Reporter,
) -> CliResult<()> {
    validate_url(&args.url)?;
    let predicate = predicate_from_args(args)?;
    let description = predicate.to_string();
    let converged = with_live_page(&config.run, &args.url, "converge", |page| async move {
        converge(&page, predicate, &args.key, args.timeout_ms).await
    })
    .await?;

    reporter.success(&format!(
        "'{}' reached {description} after {} sample(s) in {}ms",
        args.key,
        converged.attempts,
        converged.elapsed.as_millis()
    ));
    Ok(())
}

/// Execute the screenshot command
pub async fn execute_screenshot(
    config: &CliConfig,
    args: &ScreenshotArgs,
    reporter: &Reporter,
) -> CliResult<()> {
    validate_url(&args.url)?;
    let mut snapshots = config.run.snapshot_config();
    if args.update {
        snapshots = snapshots.with_update(UpdateMode::All);
    }
    let store = ScreenshotStore::new(snapshots);
    let baseline = store.baseline_path(&args.name);

    let outcome = with_live_page(&config.run, &args.url, "screenshot", |page| {
        let store = &store;
        async move { check_screenshot(&page, store, &args.name).await }
    })
    .await?;

    let message = match outcome {
        SnapshotCheck::Matched => "matches",
        SnapshotCheck::Created => "written to",
        SnapshotCheck::Updated => "updated at",
        SnapshotCheck::Mismatch => "differs from",
    };
    reporter.success(&format!("{} {message} {}", args.name, baseline.display()));
    Ok(())
}

/// Launch Chromium, open `url` in a fresh context and hand the page to `f`
#[cfg(feature = "browser")]
async fn with_live_page<T, F, Fut>(run: &RunConfig, url: &str, _command: &str, f: F) -> CliResult<T>
where
    F: FnOnce(Page) -> Fut,
    Fut: Future<Output = CliResult<T>>,
{
    use pagecheck::{CdpSessionFactory, SessionFactory};

    let factory = CdpSessionFactory::launch(run).await?;
    let result = async {
        let page = factory.new_page(run.page_options(), None).await?;
        debug!(url, "opening live page");
        let outcome = match page.goto(url).await {
            Ok(()) => f(page.clone()).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = page.close().await {
            debug!(error = %e, "closing page failed");
        }
        outcome
    }
    .await;
    factory.close().await?;
    result
}

#[cfg(not(feature = "browser"))]
async fn with_live_page<T, F, Fut>(_run: &RunConfig, url: &str, command: &str, _f: F) -> CliResult<T>
where
    F: FnOnce(Page) -> Fut,
    Fut: Future<Output = CliResult<T>>,
{
    debug!(url, command, "browser support not compiled in");
    Err(CliError::browser_disabled(command))
}
