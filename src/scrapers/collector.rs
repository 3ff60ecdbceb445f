//! Search-result walkers shared by the per-site link collectors.

use crate::scrapers::traits::{Locator, PageDriver};
use anyhow::{anyhow, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Listing URLs in discovery order, without duplicates
#[derive(Debug, Default)]
pub struct LinkSet {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkSet {
    /// Returns `false` when the URL was already known
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.links.push(url);
        true
    }

    pub fn extend(&mut self, urls: impl IntoIterator<Item = String>) -> usize {
        urls.into_iter().filter(|u| self.insert(u.clone())).count()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.links
    }
}

/// Pulls listing links out of captured page source.
///
/// Each element matching `card` contributes the `href` of its first
/// `link` match; relative hrefs are joined to `origin`.
pub fn extract_card_links(html: &str, card: &str, link: &str, origin: &str) -> Result<Vec<String>> {
    let card_selector =
        Selector::parse(card).map_err(|e| anyhow!("invalid card selector {card:?}: {e}"))?;
    let link_selector =
        Selector::parse(link).map_err(|e| anyhow!("invalid link selector {link:?}: {e}"))?;

    let document = Html::parse_document(html);
    let links = document
        .select(&card_selector)
        .filter_map(|card| card.select(&link_selector).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| {
            if href.starts_with('/') {
                format!("{}{}", origin.trim_end_matches('/'), href)
            } else {
                href.to_string()
            }
        })
        .collect();
    Ok(links)
}

/// One search page per URL, `page_url(1..=pages)`.
///
/// A page that fails to load or parse is logged and skipped.
pub fn paginate_by_url<U, E>(
    driver: &dyn PageDriver,
    pages: usize,
    page_url: U,
    ready: &Locator,
    wait: Duration,
    pause: Duration,
    extract: E,
) -> LinkSet
where
    U: Fn(usize) -> String,
    E: Fn(&str) -> Result<Vec<String>>,
{
    let mut links = LinkSet::default();

    for page in 1..=pages {
        info!("Processing results page {}...", page);

        let result = driver
            .navigate(&page_url(page))
            .and_then(|_| driver.wait_for(ready, wait))
            .and_then(|_| {
                thread::sleep(pause);
                driver.html()
            })
            .and_then(|html| extract(&html));

        match result {
            Ok(found) => {
                let total = found.len();
                let added = links.extend(found);
                info!("Page {}: {} listings, {} new", page, total, added);
            }
            Err(e) => warn!("Skipping results page {}: {:#}", page, e),
        }
    }

    links
}

/// Opens `start_url` and follows the "next page" control.
///
/// Stops when the control is gone or `pages` pages have been read.
pub fn paginate_by_next(
    driver: &dyn PageDriver,
    start_url: &str,
    pages: usize,
    anchors: &str,
    next: &Locator,
    wait: Duration,
    pause: Duration,
) -> Result<LinkSet> {
    let mut links = LinkSet::default();
    driver.navigate(start_url)?;

    for page in 1..=pages {
        info!("Processing results page {}...", page);

        let found = driver
            .wait_for(&Locator::css(anchors), wait)
            .and_then(|_| driver.hrefs(anchors));
        match found {
            Ok(found) => {
                let total = found.len();
                let added = links.extend(found);
                info!("Page {}: {} listings, {} new", page, total, added);
            }
            Err(e) => warn!("Failed to read listings on page {}: {:#}", page, e),
        }

        if page == pages {
            break;
        }
        let advanced = driver
            .wait_for(next, wait)
            .and_then(|_| driver.click(next));
        if let Err(e) = advanced {
            warn!("Could not move past page {}: {:#}", page, e);
            break;
        }
        thread::sleep(pause);
    }

    Ok(links)
}

/// Scrolls one feed page a viewport at a time until `target` links are known.
///
/// `max_scrolls` bounds the loop when the feed stops growing.
pub fn infinite_scroll(
    driver: &dyn PageDriver,
    start_url: &str,
    anchors: &str,
    target: usize,
    max_scrolls: usize,
    pause: Duration,
) -> Result<LinkSet> {
    let mut links = LinkSet::default();
    driver.navigate(start_url)?;
    let step = driver.viewport_height()?;

    let mut scrolls = 0;
    while links.len() < target {
        if scrolls == max_scrolls {
            warn!(
                "Stopped after {} scrolls with {} of {} links",
                scrolls,
                links.len(),
                target
            );
            break;
        }
        scrolls += 1;

        if let Err(e) = driver.scroll_to(step * scrolls as f64) {
            warn!("Scroll {} failed: {:#}", scrolls, e);
            continue;
        }
        thread::sleep(pause);

        match driver.hrefs(anchors) {
            Ok(found) => {
                links.extend(found);
            }
            Err(e) => warn!("Failed to read anchors after scroll {}: {:#}", scrolls, e),
        }
    }

    Ok(links)
}
