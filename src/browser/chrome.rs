//! chromiumoxide-backed browser session
//!
//! Handles:
//! - Launching a visible desktop Chrome (local mode) or a bundled headless
//!   binary (hosted mode)
//! - Evasion settings: user agent, viewport, extra headers, automation-flag
//!   suppression
//! - Blocking heavy resources
//! - Closing the browser exactly once, with a background fallback on drop

use crate::browser::{BrowserError, BrowserLauncher, BrowserSession, PageDriver};
use crate::config::{BrowserMode, BrowserOptions};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams,
    SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hides the most common automation fingerprint
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['zh-TW', 'zh', 'en-US', 'en'] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// URL patterns skipped when resource blocking is on
const BLOCKED_RESOURCE_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.css", "*.woff",
    "*.woff2", "*.ttf", "*.otf", "*.mp4", "*.webm", "*.mp3",
];

/// Minimal flag set for the bundled headless binary
const HOSTED_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-zygote",
    "--single-process",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Launches Chrome according to the `[browser]` configuration
pub struct ChromeLauncher {
    options: BrowserOptions,
}

impl ChromeLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    /// Binary to launch, or `None` to let chromiumoxide detect one
    fn executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.options.executable_path {
            return Some(path.clone());
        }

        match self.options.mode {
            BrowserMode::Local => Some(default_desktop_chrome()),
            BrowserMode::Hosted => None,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let viewport = Viewport {
            width: self.options.viewport_width,
            height: self.options.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        };

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled")
            .window_size(self.options.viewport_width, self.options.viewport_height)
            .viewport(viewport);

        match self.options.mode {
            BrowserMode::Local => {
                builder = builder.with_head();
            }
            BrowserMode::Hosted => {
                builder = builder.args(HOSTED_ARGS.iter().copied());
            }
        }

        if let Some(path) = self.executable() {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(BrowserError::Launch)
    }

    /// Applies evasion and blocking settings to a fresh tab
    async fn prepare_page(&self, page: &Page) -> Result<(), BrowserError> {
        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(self.options.user_agent.clone())
            .accept_language(self.options.accept_language.clone())
            .build()
            .map_err(BrowserError::Protocol)?;
        page.set_user_agent(user_agent).await.map_err(protocol)?;

        page.execute(EnableParams::default()).await.map_err(protocol)?;

        let headers = Headers::new(serde_json::json!({
            "Accept-Language": self.options.accept_language,
            "Upgrade-Insecure-Requests": "1",
        }));
        page.execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .map_err(protocol)?;

        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            STEALTH_SCRIPT.to_string(),
        ))
        .await
        .map_err(protocol)?;

        if self.options.block_resources {
            let patterns = BLOCKED_RESOURCE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>();
            page.execute(SetBlockedUrLsParams::new(patterns))
                .await
                .map_err(protocol)?;
        }

        Ok(())
    }
}

fn default_desktop_chrome() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
    } else {
        PathBuf::from("/usr/bin/google-chrome")
    }
}

fn protocol(e: chromiumoxide::error::CdpError) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let config = self.browser_config()?;
        tracing::info!(
            "Launching browser ({:?} mode, executable: {})",
            self.options.mode,
            self.executable()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto-detected".to_string())
        );

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(BrowserError::Launch(format!("failed to open tab: {}", e)));
            }
        };

        if let Err(e) = self.prepare_page(&page).await {
            let _ = browser.close().await;
            handler_task.abort();
            return Err(BrowserError::Launch(format!("failed to configure tab: {}", e)));
        }

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            handler_task: Some(handler_task),
            page: ChromePage { page },
        }))
    }
}

/// A launched Chrome process plus its single tab
pub struct ChromeSession {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    page: ChromePage,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    fn page(&self) -> &dyn PageDriver {
        &self.page
    }

    async fn release(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };

        if let Err(e) = browser.close().await {
            tracing::warn!("Browser close failed: {}", e);
        }
        if let Err(e) = browser.wait().await {
            tracing::warn!("Waiting for browser exit failed: {}", e);
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        tracing::debug!("Browser released");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        let handler_task = self.handler_task.take();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = browser.close().await {
                        tracing::warn!("Browser drop cleanup failed: {}", e);
                    }
                    let _ = browser.wait().await;
                    if let Some(task) = handler_task {
                        task.abort();
                    }
                });
            }
            Err(_) => {
                tracing::warn!("Browser dropped outside a runtime; process may linger");
            }
        }
    }
}

/// chromiumoxide tab implementing [`PageDriver`]
pub struct ChromePage {
    page: Page,
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            }),
        }
    }

    async fn title(&self) -> Result<Option<String>, BrowserError> {
        self.page.get_title().await.map_err(protocol)
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| BrowserError::Timeout {
                what: format!("selector '{}'", selector),
                after: timeout,
            })
    }

    async fn has_element(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn click_and_settle(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(protocol)?;

        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(protocol(e)),
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation after clicking '{}'", selector),
                after: timeout,
            }),
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(protocol)
    }
}
