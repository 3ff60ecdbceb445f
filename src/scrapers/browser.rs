use crate::config::AppConfig;
use crate::scrapers::traits::{Locator, PageDriver};
use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Headless Chrome tab owned by a single pipeline stage.
///
/// The browser process is shut down when the session is dropped, so every
/// exit path of a stage releases it.
pub struct BrowserSession {
    tab: Arc<Tab>,
    // Keeps the Chrome process alive for as long as the tab is in use.
    _browser: Browser,
}

impl BrowserSession {
    /// Launch Chrome configured for scraping
    pub fn launch(config: &AppConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .path(config.chrome_path.clone())
            .idle_browser_timeout(Duration::from_secs(600))
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--ignore-certificate-errors"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ])
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(&config.user_agent, Some("ru-RU,ru;q=0.9"), None)
            .context("Failed to set user agent")?;

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    fn evaluate_string(&self, script: &str) -> Result<String> {
        let result = self.tab.evaluate(script, false)?;
        result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("script returned no string"))
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to open {url}"))?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        match locator {
            Locator::Css(s) => self.tab.wait_for_element_with_custom_timeout(s, timeout)?,
            Locator::XPath(s) => self.tab.wait_for_xpath_with_custom_timeout(s, timeout)?,
        };
        Ok(())
    }

    fn text(&self, locator: &Locator) -> Result<String> {
        let element = match locator {
            Locator::Css(s) => self.tab.find_element(s)?,
            Locator::XPath(s) => self.tab.find_element_by_xpath(s)?,
        };
        element.get_inner_text()
    }

    fn texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let elements = match locator {
            Locator::Css(s) => self.tab.find_elements(s)?,
            Locator::XPath(s) => self.tab.find_elements_by_xpath(s)?,
        };
        elements.iter().map(|e| e.get_inner_text()).collect()
    }

    fn hrefs(&self, selector: &str) -> Result<Vec<String>> {
        // `a.href` is already resolved against the page URL
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(a => a.href).filter(Boolean))",
            serde_json::to_string(selector)?
        );
        let json = self.evaluate_string(&script)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn click(&self, locator: &Locator) -> Result<()> {
        let element = match locator {
            Locator::Css(s) => self.tab.find_element(s)?,
            Locator::XPath(s) => self.tab.find_element_by_xpath(s)?,
        };
        element.click()?;
        Ok(())
    }

    fn html(&self) -> Result<String> {
        self.evaluate_string("document.documentElement.outerHTML")
    }

    fn scroll_to(&self, y: f64) -> Result<()> {
        self.tab.evaluate(&format!("window.scrollTo(0, {y});"), false)?;
        Ok(())
    }

    fn viewport_height(&self) -> Result<f64> {
        let result = self.tab.evaluate("window.screen.height", false)?;
        result
            .value
            .as_ref()
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow!("window.screen.height is not a number"))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        debug!("Closing browser session");
        let _ = self.tab.close(true);
    }
}
