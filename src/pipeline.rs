//! The four steps of a source pipeline: collect links, fetch details,
//! normalize, load. Each step reads what the previous one wrote.

use crate::config::AppConfig;
use crate::models::{NormalizedListing, Source};
use crate::normalize::{normalize_all, NormalizeReport};
use crate::scrapers::{fetcher, listing_source, BrowserSession, CollectBudget};
use crate::sink::TableSink;
use crate::store;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

/// One source's ETL run
pub struct Pipeline {
    source: Source,
    config: AppConfig,
}

impl Pipeline {
    pub fn new(source: Source, config: AppConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Budget used when the caller gives none
    pub fn default_budget(&self) -> CollectBudget {
        listing_source(self.source).default_budget()
    }

    /// Walks the search results and writes the unique listing URLs.
    pub async fn collect_links(&self, budget: CollectBudget) -> Result<usize> {
        info!("[{}] Collecting links with {:?}", self.source, budget);

        let source = self.source;
        let config = self.config.clone();
        let links = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let session = BrowserSession::launch(&config)?;
            Ok(listing_source(source).collect_links(&session, &budget, config.listing_pause))
        })
        .await
        .context("Link collector panicked")??;

        let path = store::write_links(&self.config.data_dir, self.source, &links).await?;
        info!(
            "[{}] Collected {} links into {}",
            self.source,
            links.len(),
            path.display()
        );
        Ok(links.len())
    }

    /// Visits every collected link and writes the raw records in one go.
    pub async fn fetch_details(&self) -> Result<usize> {
        let links = store::read_links(&self.config.data_dir, self.source).await?;
        info!("[{}] Loaded {} links", self.source, links.len());
        if links.is_empty() {
            warn!("[{}] No links to fetch", self.source);
        }

        let source = self.source;
        let config = self.config.clone();
        let listings = tokio::task::spawn_blocking(move || -> Result<_> {
            let session = BrowserSession::launch(&config)?;
            Ok(fetcher::fetch_all(
                listing_source(source),
                &session,
                &links,
                config.listing_pause,
            ))
        })
        .await
        .context("Detail fetcher panicked")??;

        let path = store::write_raw(&self.config.data_dir, self.source, &listings).await?;
        info!(
            "[{}] Saved {} listings to {}",
            self.source,
            listings.len(),
            path.display()
        );
        Ok(listings.len())
    }

    /// Reads the raw records and derives the admitted, typed rows.
    pub async fn normalize(&self) -> Result<NormalizeReport> {
        self.normalize_as_of(Local::now().date_naive()).await
    }

    /// [`Pipeline::normalize`] with an explicit run day
    pub async fn normalize_as_of(&self, today: NaiveDate) -> Result<NormalizeReport> {
        let raws = store::read_raw(&self.config.data_dir, self.source).await?;
        let rules = listing_source(self.source);
        Ok(normalize_all(self.source, &raws, |raw| rules.normalize(raw, today)))
    }

    /// Replaces the source's table with `listings`.
    pub async fn load(&self, listings: Vec<NormalizedListing>) -> Result<bool> {
        let sink = TableSink::new(&self.config.database_path);
        let table = self.source.name();
        tokio::task::spawn_blocking(move || sink.replace(table, &listings))
            .await
            .context("Sink panicked")
    }

    /// All four steps in order.
    pub async fn run(&self, budget: CollectBudget) -> Result<bool> {
        info!("🚗 [{}] Pipeline started", self.source);

        self.collect_links(budget).await?;
        self.fetch_details().await?;
        let report = self.normalize().await?;
        let loaded = self.load(report.listings).await?;

        info!(
            "[{}] Pipeline finished: {} rejected rows, load {}",
            self.source,
            report.rejected,
            if loaded { "succeeded" } else { "failed" }
        );
        Ok(loaded)
    }
}
