//! Browser control for live runs.
//!
//! Configuration types are always available so run configs can be parsed
//! and printed without a browser. With the `browser` feature, [`CdpBrowser`]
//! launches Chromium through chromiumoxide and hands out one [`CdpDriver`]
//! per session, each in its own browser context.

use serde::{Deserialize, Serialize};

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport applied to every page
    pub viewport: Viewport,
    /// Device profile name, informational
    pub device: String,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            device: String::from("Desktop Chrome"),
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Locale and timezone emulated in every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    /// BCP 47 locale
    pub locale: String,
    /// IANA timezone
    pub timezone_id: String,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            locale: String::from("en-GB"),
            timezone_id: String::from("Europe/Paris"),
        }
    }
}

/// Key description for `Input.dispatchKeyEvent`: `(code, windows key code, text)`
#[must_use]
pub fn key_definition(key: &str) -> (String, i64, Option<String>) {
    match key {
        "Enter" => ("Enter".into(), 13, Some("\r".into())),
        "Escape" => ("Escape".into(), 27, None),
        "Tab" => ("Tab".into(), 9, None),
        "Backspace" => ("Backspace".into(), 8, None),
        "Delete" => ("Delete".into(), 46, None),
        "ArrowUp" => ("ArrowUp".into(), 38, None),
        "ArrowDown" => ("ArrowDown".into(), 40, None),
        "ArrowLeft" => ("ArrowLeft".into(), 37, None),
        "ArrowRight" => ("ArrowRight".into(), 39, None),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => (
                    format!("Key{}", c.to_ascii_uppercase()),
                    i64::from(c.to_ascii_uppercase() as u8),
                    Some(other.to_string()),
                ),
                (Some(c), None) if c.is_ascii_digit() => {
                    (format!("Digit{c}"), i64::from(c as u8), Some(other.to_string()))
                }
                (Some(_), None) => (String::new(), 0, Some(other.to_string())),
                _ => (other.to_string(), 0, None),
            }
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{CdpBrowser, CdpDriver};

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::{key_definition, BrowserConfig, EmulationConfig};
    use crate::driver::{Action, Actionability, Driver, ElementState};
    use crate::locator::Selector;
    use crate::result::{PagecheckError, PagecheckResult};
    use crate::wait::LoadState;
    use async_trait::async_trait;
    use base64::Engine as _;
    use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::emulation::{
        SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
    };
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
    };
    use chromiumoxide::js::EvaluationResult;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::Deserialize;
    use std::fmt::Display;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tracing::{debug, info, warn};

    const RESOLVER: &str = include_str!("resolver.js");
    const READY_POLL_MS: u64 = 25;

    fn session_err(e: impl Display) -> PagecheckError {
        PagecheckError::session(e.to_string())
    }

    fn eval_err(e: impl Display) -> PagecheckError {
        PagecheckError::evaluation(e.to_string())
    }

    /// Decode an evaluation result; JS `null` and `undefined` carry no
    /// value on the wire and decode as JSON `null`
    pub(crate) fn decode<T: serde::de::DeserializeOwned>(
        result: &EvaluationResult,
    ) -> PagecheckResult<T> {
        let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).map_err(eval_err)
    }

    /// Chromium process shared by every session of a run
    #[derive(Debug)]
    pub struct CdpBrowser {
        config: BrowserConfig,
        emulation: EmulationConfig,
        inner: Arc<Mutex<Browser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl CdpBrowser {
        /// Launch Chromium
        pub async fn launch(
            config: BrowserConfig,
            emulation: EmulationConfig,
        ) -> PagecheckResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport.width, config.viewport.height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(|message| {
                if config.chromium_path.is_none() {
                    PagecheckError::BrowserNotFound
                } else {
                    PagecheckError::BrowserLaunch { message }
                }
            })?;

            let (browser, mut handler) =
                Browser::launch(cdp_config)
                    .await
                    .map_err(|e| PagecheckError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            info!(headless = config.headless, "chromium launched");
            Ok(Self {
                config,
                emulation,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Open a tab in a fresh browser context with emulation applied
        pub async fn new_driver(&self) -> PagecheckResult<CdpDriver> {
            let (context, page) = {
                let mut browser = self.inner.lock().await;
                let context = browser
                    .create_browser_context(CreateBrowserContextParams::default())
                    .await
                    .map_err(session_err)?;
                let target = CreateTargetParams::builder()
                    .url("about:blank")
                    .browser_context_id(context.clone())
                    .build()
                    .map_err(PagecheckError::session)?;
                let page = browser.new_page(target).await.map_err(session_err)?;
                (context, page)
            };

            let metrics = SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(self.config.viewport.width))
                .height(i64::from(self.config.viewport.height))
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(PagecheckError::session)?;
            page.execute(metrics).await.map_err(session_err)?;
            page.execute(SetLocaleOverrideParams {
                locale: Some(self.emulation.locale.clone()),
            })
            .await
            .map_err(session_err)?;
            page.execute(SetTimezoneOverrideParams::new(
                self.emulation.timezone_id.clone(),
            ))
            .await
            .map_err(session_err)?;

            debug!(context = ?context, "session opened");
            Ok(CdpDriver {
                page,
                context: Some(context),
                browser: Arc::clone(&self.inner),
            })
        }

        /// Close the browser
        pub async fn close(self) -> PagecheckResult<()> {
            let mut browser = self.inner.lock().await;
            browser.close().await.map_err(session_err)?;
            let _ = browser.wait().await;
            self.handle.abort();
            Ok(())
        }
    }

    /// What the in-page resolver left for the driver to do
    #[derive(Debug, Deserialize)]
    #[serde(tag = "mode", rename_all = "lowercase")]
    enum Dispatch {
        Done,
        Stale,
        Keys,
        Mouse { x: f64, y: f64, clicks: i64 },
    }

    /// One tab in an isolated browser context
    #[derive(Debug)]
    pub struct CdpDriver {
        page: CdpPage,
        context: Option<BrowserContextId>,
        browser: Arc<Mutex<Browser>>,
    }

    impl CdpDriver {
        async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> PagecheckResult<T> {
            let result = self.page.evaluate(script).await.map_err(eval_err)?;
            decode(&result)
        }

        async fn wait_ready(&self, load_state: LoadState) -> PagecheckResult<()> {
            loop {
                let state: String = self.eval("document.readyState".to_string()).await?;
                if load_state.ready_states().contains(&state.as_str()) {
                    return Ok(());
                }
                tokio::time::sleep(Duration::from_millis(READY_POLL_MS)).await;
            }
        }

        async fn mouse(&self, x: f64, y: f64, clicks: i64) -> PagecheckResult<()> {
            let moved = DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MouseMoved)
                .x(x)
                .y(y)
                .build()
                .map_err(PagecheckError::session)?;
            self.page.execute(moved).await.map_err(session_err)?;

            for count in 1..=clicks {
                for kind in [
                    DispatchMouseEventType::MousePressed,
                    DispatchMouseEventType::MouseReleased,
                ] {
                    let params = DispatchMouseEventParams::builder()
                        .r#type(kind)
                        .x(x)
                        .y(y)
                        .button(MouseButton::Left)
                        .click_count(count)
                        .build()
                        .map_err(PagecheckError::session)?;
                    self.page.execute(params).await.map_err(session_err)?;
                }
            }
            Ok(())
        }

        async fn keys(&self, key: &str) -> PagecheckResult<()> {
            let (code, vk, text) = key_definition(key);
            let mut down = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .key(key)
                .code(code.clone())
                .windows_virtual_key_code(vk);
            if let Some(text) = text {
                down = down.text(text);
            }
            let down = down.build().map_err(PagecheckError::session)?;
            self.page.execute(down).await.map_err(session_err)?;

            let up = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .key(key)
                .code(code)
                .windows_virtual_key_code(vk)
                .build()
                .map_err(PagecheckError::session)?;
            self.page.execute(up).await.map_err(session_err)?;
            Ok(())
        }
    }

    #[async_trait]
    impl Driver for CdpDriver {
        async fn goto(&self, url: &str, load_state: LoadState) -> PagecheckResult<()> {
            debug!(url, %load_state, "navigating");
            self.page
                .goto(url)
                .await
                .map_err(|e| PagecheckError::navigation(url, e.to_string()))?;
            self.wait_ready(load_state).await
        }

        async fn reload(&self, load_state: LoadState) -> PagecheckResult<()> {
            let url = self.url().await?;
            self.page
                .reload()
                .await
                .map_err(|e| PagecheckError::navigation(url, e.to_string()))?;
            self.wait_ready(load_state).await
        }

        async fn go_back(&self) -> PagecheckResult<()> {
            let _: serde_json::Value = self
                .eval("history.back(), null".to_string())
                .await?;
            tokio::time::sleep(Duration::from_millis(READY_POLL_MS)).await;
            self.wait_ready(LoadState::DomContentLoaded).await
        }

        async fn url(&self) -> PagecheckResult<String> {
            Ok(self
                .page
                .url()
                .await
                .map_err(session_err)?
                .unwrap_or_else(|| "about:blank".to_string()))
        }

        async fn title(&self) -> PagecheckResult<String> {
            Ok(self
                .page
                .get_title()
                .await
                .map_err(session_err)?
                .unwrap_or_default())
        }

        async fn query(&self, selector: &Selector) -> PagecheckResult<Vec<ElementState>> {
            let steps = selector.to_json()?;
            self.eval(format!("{RESOLVER}\nwindow.__pagecheck.query({steps})"))
                .await
        }

        async fn perform(
            &self,
            selector: &Selector,
            action: &Action,
        ) -> PagecheckResult<Actionability> {
            let states = self.query(selector).await?;
            let verdict = Actionability::of(&states, action);
            if verdict != Actionability::Ready {
                return Ok(verdict);
            }

            let steps = selector.to_json()?;
            let action_json = serde_json::to_string(action)?;
            let dispatch: Dispatch = self
                .eval(format!(
                    "{RESOLVER}\nwindow.__pagecheck.dispatch({steps}, {action_json})"
                ))
                .await?;
            debug!(%selector, %action, ?dispatch, "dispatching");

            match (dispatch, action) {
                (Dispatch::Stale, _) => Ok(Actionability::Missing),
                (Dispatch::Mouse { x, y, clicks }, _) => {
                    self.mouse(x, y, clicks).await?;
                    Ok(Actionability::Ready)
                }
                (Dispatch::Keys, Action::Press(key)) => {
                    self.keys(key).await?;
                    Ok(Actionability::Ready)
                }
                (Dispatch::Keys | Dispatch::Done, _) => Ok(Actionability::Ready),
            }
        }

        async fn press_key(&self, key: &str) -> PagecheckResult<()> {
            self.keys(key).await
        }

        async fn evaluate(&self, script: &str) -> PagecheckResult<serde_json::Value> {
            let result = self.page.evaluate(script).await.map_err(eval_err)?;
            decode(&result)
        }

        async fn local_storage(&self, key: &str) -> PagecheckResult<Option<String>> {
            let key = serde_json::to_string(key)?;
            self.eval(format!("window.localStorage.getItem({key})"))
                .await
        }

        async fn screenshot(&self) -> PagecheckResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let response = self
                .page
                .execute(params)
                .await
                .map_err(|e| PagecheckError::Screenshot {
                    message: e.to_string(),
                })?;
            let data: &str = response.data.as_ref();
            base64::engine::general_purpose::STANDARD
                .decode(data.as_bytes())
                .map_err(|e| PagecheckError::Screenshot {
                    message: format!("base64 decode failed: {e}"),
                })
        }

        async fn close(&self) -> PagecheckResult<()> {
            if let Err(e) = self.page.clone().close().await {
                warn!(error = %e, "closing tab failed");
            }
            if let Some(context) = self.context.clone() {
                let browser = self.browser.lock().await;
                browser
                    .execute(DisposeBrowserContextParams::new(context))
                    .await
                    .map_err(session_err)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.viewport, Viewport { width: 1280, height: 720 });
        assert_eq!(config.device, "Desktop Chrome");
        let emulation = EmulationConfig::default();
        assert_eq!(emulation.locale, "en-GB");
        assert_eq!(emulation.timezone_id, "Europe/Paris");
    }

    #[test]
    fn test_builders() {
        let config = BrowserConfig::default()
            .with_viewport(800, 600)
            .with_headless(false)
            .with_chromium_path("/usr/bin/chromium")
            .with_no_sandbox();
        assert_eq!(config.viewport.width, 800);
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[test]
    fn test_partial_yaml() {
        let config: BrowserConfig = serde_yaml_ng::from_str("headless: false\n").unwrap();
        assert!(!config.headless);
        assert_eq!(config.viewport.height, 720);
    }

    #[test]
    fn test_key_definitions() {
        assert_eq!(key_definition("Enter"), ("Enter".into(), 13, Some("\r".into())));
        assert_eq!(key_definition("Escape").1, 27);
        assert_eq!(key_definition("a"), ("KeyA".into(), 65, Some("a".into())));
        assert_eq!(key_definition("7").0, "Digit7");
    }

    #[cfg(feature = "browser")]
    mod decode_tests {
        use super::super::cdp::decode;
        use crate::result::PagecheckError;
        use chromiumoxide::cdp::js_protocol::runtime::RemoteObject;
        use chromiumoxide::js::EvaluationResult;

        fn result(json: &str) -> EvaluationResult {
            EvaluationResult::new(serde_json::from_str::<RemoteObject>(json).unwrap())
        }

        #[test]
        fn test_null_decodes_as_absent() {
            let null = result(r#"{"type":"object","subtype":"null","value":null}"#);
            assert_eq!(decode::<Option<String>>(&null).unwrap(), None);
            assert_eq!(decode::<serde_json::Value>(&null).unwrap(), serde_json::Value::Null);
        }

        #[test]
        fn test_undefined_decodes_as_absent() {
            let undefined = result(r#"{"type":"undefined"}"#);
            assert_eq!(decode::<Option<String>>(&undefined).unwrap(), None);
        }

        #[test]
        fn test_string_value() {
            let stored = result(r#"{"type":"string","value":"[]"}"#);
            assert_eq!(decode::<Option<String>>(&stored).unwrap().as_deref(), Some("[]"));
        }

        #[test]
        fn test_type_mismatch_is_evaluation_error() {
            let number = result(r#"{"type":"number","value":3}"#);
            assert!(matches!(
                decode::<String>(&number),
                Err(PagecheckError::Evaluation { .. })
            ));
        }
    }
}
