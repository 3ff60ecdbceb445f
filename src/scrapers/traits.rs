use crate::models::{NormalizedListing, RawListing, Source};
use crate::normalize::Rejection;
use crate::scrapers::types::CollectBudget;
use anyhow::Result;
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;

/// How an element is looked up on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn xpath(query: &str) -> Self {
        Locator::XPath(query.to_string())
    }

    /// `//th[contains(text(), 'label')]/following-sibling::td` style lookup
    pub fn labelled(label_tag: &str, label: &str, value_tag: &str) -> Self {
        Locator::XPath(format!(
            "//{label_tag}[contains(text(), '{label}')]/following-sibling::{value_tag}"
        ))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{s}"),
            Locator::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// A controllable browser tab.
///
/// Every call blocks until the page answers or the lookup fails.
pub trait PageDriver {
    fn navigate(&self, url: &str) -> Result<()>;

    /// Waits until `locator` matches something on the page
    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Visible text of the first match
    fn text(&self, locator: &Locator) -> Result<String>;

    /// Visible text of every match
    fn texts(&self, locator: &Locator) -> Result<Vec<String>>;

    /// Absolute `href` of every anchor matching a CSS selector
    fn hrefs(&self, selector: &str) -> Result<Vec<String>>;

    fn click(&self, locator: &Locator) -> Result<()>;

    /// Current page source
    fn html(&self) -> Result<String>;

    fn scroll_to(&self, y: f64) -> Result<()>;

    fn viewport_height(&self) -> Result<f64>;
}

/// Site-specific scraping and cleaning for one classifieds source
pub trait ListingSource: Send + Sync {
    fn source(&self) -> Source;

    /// Default page or scroll budget for the link collector
    fn default_budget(&self) -> CollectBudget;

    /// Visits search results and returns unique listing URLs in discovery order
    fn collect_links(
        &self,
        driver: &dyn PageDriver,
        budget: &CollectBudget,
        pause: Duration,
    ) -> Vec<String>;

    /// Extracts raw fields from one listing page.
    ///
    /// An `Err` means the listing itself could not be read and is skipped.
    fn fetch_listing(&self, driver: &dyn PageDriver, url: &str) -> Result<RawListing>;

    /// Derives a typed row, or explains why the row is not admitted
    fn normalize(&self, raw: &RawListing, today: NaiveDate) -> Result<NormalizedListing, Rejection>;
}
