use crate::scrapers::traits::PageSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Headless Chrome settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Extra wait after navigation so client-rendered results settle
    pub settle_ms: u64,
    /// Per-operation timeout for navigation and DOM reads
    pub timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            settle_ms: 2000,
            timeout_secs: 30,
        }
    }
}

/// Page source backed by a headless Chrome instance
pub struct BrowserSource {
    browser: Browser,
    settings: BrowserSettings,
}

impl BrowserSource {
    /// Launch a new browser
    pub fn launch(settings: &BrowserSettings) -> Result<Self> {
        info!("Launching headless Chrome...");

        let args = vec![
            OsStr::new("--disable-notifications"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--disable-extensions"),
        ];
        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .args(args)
            .idle_browser_timeout(Duration::from_secs(settings.timeout_secs.saturating_mul(4)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options)
            .context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser,
            settings: settings.clone(),
        })
    }

    fn load_blocking(browser: &Browser, url: &str, settings: &BrowserSettings) -> Result<String> {
        let tab = browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(Duration::from_secs(settings.timeout_secs));

        run_then_close(
            || Self::read_tab(&tab, url, settings),
            || {
                if let Err(e) = tab.close(true) {
                    debug!("Failed to close tab: {e}");
                }
            },
        )
    }

    fn read_tab(tab: &Tab, url: &str, settings: &BrowserSettings) -> Result<String> {
        tab.navigate_to(url)
            .with_context(|| format!("Failed to navigate to {url}"))?;
        tab.wait_until_navigated()
            .with_context(|| format!("Navigation to {url} did not finish"))?;

        thread::sleep(Duration::from_millis(settings.settle_ms));

        tab.get_content().context("Failed to read page HTML")
    }
}

/// Run `work`, then `close` whatever the outcome
fn run_then_close<T>(work: impl FnOnce() -> Result<T>, close: impl FnOnce()) -> Result<T> {
    let result = work();
    close();
    result
}

#[async_trait]
impl PageSource for BrowserSource {
    async fn load(&self, url: &str) -> Result<String> {
        info!("Fetching: {}", url);

        let browser = self.browser.clone();
        let settings = self.settings.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || Self::load_blocking(&browser, &url, &settings))
            .await
            .context("Browser task panicked")?
    }

    fn source_name(&self) -> &'static str {
        "headless-chrome"
    }
}
