//! Documentation site scenario bodies

use pagecheck::prelude::*;

pub async fn has_title(docs: DocsHomePage) -> PagecheckResult<()> {
    expect_page(docs.page()).to_have_title(DOCS_TITLE).await?;
    expect_page(docs.page())
        .to_match_title(TextMatch::pattern("Playwright"))
        .await
}

pub async fn mode_button(docs: DocsHomePage) -> PagecheckResult<()> {
    expect(&docs.mode_button).to_be_enabled().await?;
    expect(&docs.mode_button).to_be_visible().await?;
    docs.toggle_mode().await?;
    expect(&docs.mode_button).to_be_visible().await
}

pub async fn copyright(docs: DocsHomePage) -> PagecheckResult<()> {
    expect(&docs.copyright).to_be_visible().await?;
    expect(&docs.copyright).to_contain_text("Microsoft").await?;
    expect(&docs.copyright)
        .to_contain_text(&docs.year.to_string())
        .await
}

pub async fn docs_link(docs: DocsHomePage) -> PagecheckResult<()> {
    expect(&docs.docs_link).to_be_visible().await?;
    docs.open_docs().await?;
    expect_page(docs.page()).to_have_url(DOCS_INTRO_URL).await
}

/// Search modal opens on click and closes on Escape
pub async fn search_round_trip(docs: DocsHomePage) -> PagecheckResult<()> {
    expect(&docs.search_input).to_be_hidden().await?;
    docs.open_search().await?;
    expect(&docs.search_input).to_be_visible().await?;
    docs.close_search().await?;
    expect(&docs.search_input).to_be_hidden().await?;
    expect(&docs.search_input).not().to_be_visible().await
}

/// The home page matches its stored baseline, recording it on first run
pub async fn screenshot_baseline(docs: DocsHomePage, store: ScreenshotStore) -> PagecheckResult<()> {
    expect_page(docs.page()).to_have_title(DOCS_TITLE).await?;
    expect(&docs.copyright).to_be_visible().await?;
    expect_page(docs.page())
        .to_have_screenshot(&store, "docs-home")
        .await?;
    let again = expect_page(docs.page())
        .to_have_screenshot(&store, "docs-home")
        .await?;
    assert!(matches!(again, SnapshotCheck::Matched | SnapshotCheck::Updated));
    Ok(())
}
