use crate::models::RawListing;
use crate::scrapers::traits::{ListingSource, PageDriver};
use anyhow::Result;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs one field lookup; any failure or blank text becomes `None`.
pub fn field<F>(name: &str, lookup: F) -> Option<String>
where
    F: FnOnce() -> Result<String>,
{
    match lookup() {
        Ok(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Err(e) => {
            debug!("Field `{}` not found: {:#}", name, e);
            None
        }
    }
}

impl RawListing {
    /// Looks up `name` and stores the result, found or not
    pub fn extract<F>(&mut self, name: &str, lookup: F)
    where
        F: FnOnce() -> Result<String>,
    {
        let value = field(name, lookup);
        self.set(name, value);
    }
}

/// Finds the `li` whose text contains `label` and returns the rest of it.
///
/// "Коробка передач: механика" with label "Коробка передач:" -> "механика"
pub fn labelled_value(items: &[String], label: &str) -> Option<String> {
    items
        .iter()
        .find(|item| item.contains(label))
        .map(|item| item.replace(label, "").trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Visits every link in order, pausing between visits.
///
/// A listing whose page cannot be read is logged and skipped; the rest are
/// returned in the order they were fetched.
pub fn fetch_all(
    source: &dyn ListingSource,
    driver: &dyn PageDriver,
    links: &[String],
    pause: Duration,
) -> Vec<RawListing> {
    let mut listings = Vec::with_capacity(links.len());

    for (idx, link) in links.iter().enumerate() {
        info!("[{}] Processing {}/{}: {}", source.source(), idx + 1, links.len(), link);

        match source.fetch_listing(driver, link) {
            Ok(listing) => listings.push(listing),
            Err(e) => warn!("[{}] Skipping {}: {:#}", source.source(), link, e),
        }

        thread::sleep(pause);
    }

    info!(
        "[{}] Fetched {} of {} listings",
        source.source(),
        listings.len(),
        links.len()
    );
    listings
}
