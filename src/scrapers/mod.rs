pub mod autoru;
pub mod avito;
pub mod browser;
pub mod collector;
pub mod drom;
pub mod fetcher;
pub mod traits;
pub mod types;
pub mod youla;

pub use autoru::Autoru;
pub use avito::Avito;
pub use browser::BrowserSession;
pub use drom::Drom;
pub use traits::{ListingSource, Locator, PageDriver};
pub use types::CollectBudget;
pub use youla::Youla;

use crate::models::Source;

/// Site-specific scraping rules for `source`
pub fn listing_source(source: Source) -> &'static dyn ListingSource {
    match source {
        Source::Autoru => &Autoru,
        Source::Avito => &Avito,
        Source::Drom => &Drom,
        Source::Youla => &Youla,
    }
}
