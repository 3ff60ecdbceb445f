use crate::models::{NormalizedListing, RawListing, Source};
use crate::normalize::date::parse_day_month;
use crate::normalize::{
    normalize_transmission, parse_mileage, parse_price, plausible_year, required, split_title,
    validate_drive_type, Rejection,
};
use crate::scrapers::collector::infinite_scroll;
use crate::scrapers::traits::{ListingSource, Locator, PageDriver};
use crate::scrapers::types::CollectBudget;
use anyhow::Result;
use chrono::NaiveDate;
use std::thread;
use std::time::Duration;
use tracing::warn;

const FEED_URL: &str = "https://youla.ru/moskva/auto/s-probegom";
const ANCHORS: &str = "a[href*='/moskva/auto/']";
const SHOW_ALL: &str = "//button[contains(text(), 'Все параметры')]";
const EXPAND_PAUSE: Duration = Duration::from_secs(1);

const MANUAL: &str = "Механика";

/// Raw field name and the `dt` label of its row
const PARAMS: [(&str, &str); 11] = [
    ("year", "Год выпуска"),
    ("power", "Мощность"),
    ("fuel", "Тип двигателя"),
    ("engine_volume", "Объем двигателя"),
    ("transmission", "Коробка передач"),
    ("mileage", "Пробег"),
    ("body_type", "Кузов"),
    ("drive_type", "Привод"),
    ("description", "Описание"),
    ("location", "Местоположение"),
    ("publication_date", "Размещено"),
];

/// youla.ru: infinite-scroll feed, `dt`/`dd` parameter list
pub struct Youla;

/// "Бензиновый" -> "бензин"; other fuels are not tracked
pub fn fuel_to_engine_type(fuel: &str) -> Option<String> {
    match fuel {
        "Бензиновый" => Some("бензин".to_string()),
        "Дизельный" => Some("дизель".to_string()),
        _ => None,
    }
}

/// "2.0 л" -> 2.0
pub fn parse_engine_volume(raw: &str) -> Option<f64> {
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.trim().trim_end_matches('л').trim().parse().ok()
}

/// Unspecified dates stay null; text the parser does not know falls back to
/// the run day, which is how the site shows fresh listings.
fn publication_date(raw: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw?;
    Some(parse_day_month(text, today).unwrap_or(today))
}

impl ListingSource for Youla {
    fn source(&self) -> Source {
        Source::Youla
    }

    fn default_budget(&self) -> CollectBudget {
        CollectBudget::scroll(50, 40)
    }

    fn collect_links(
        &self,
        driver: &dyn PageDriver,
        budget: &CollectBudget,
        pause: Duration,
    ) -> Vec<String> {
        match infinite_scroll(
            driver,
            FEED_URL,
            ANCHORS,
            budget.target_links,
            budget.max_scrolls,
            pause,
        ) {
            Ok(links) => links.into_vec(),
            Err(e) => {
                warn!("[youla] Feed unavailable: {:#}", e);
                Vec::new()
            }
        }
    }

    fn fetch_listing(&self, driver: &dyn PageDriver, url: &str) -> Result<RawListing> {
        driver.navigate(url)?;

        if driver.click(&Locator::xpath(SHOW_ALL)).is_ok() {
            thread::sleep(EXPAND_PAUSE);
        }

        let mut raw = RawListing::new(url);
        raw.extract("title", || {
            driver.text(&Locator::css(r#"h2[data-test-block="ProductCaption"]"#))
        });
        raw.extract("price", || driver.text(&Locator::css("span.sc-fxhZON.fzJDlO")));
        for (name, label) in PARAMS {
            raw.extract(name, || driver.text(&Locator::labelled("dt", label, "dd")));
        }
        Ok(raw)
    }

    fn normalize(&self, raw: &RawListing, today: NaiveDate) -> Result<NormalizedListing, Rejection> {
        let title = required(raw, "title")?;
        let parts = split_title(title)
            .filter(|p| plausible_year(p.year, today))
            .ok_or_else(|| Rejection::unparseable("title", title))?;

        let price_text = required(raw, "price")?;
        let price = parse_price(price_text).ok_or_else(|| Rejection::unparseable("price", price_text))?;

        let mileage_text = required(raw, "mileage")?;
        let mileage =
            parse_mileage(mileage_text).ok_or_else(|| Rejection::unparseable("mileage", mileage_text))?;

        Ok(NormalizedListing {
            brand: parts.brand,
            model: parts.model,
            year: parts.year,
            price,
            engine_volume: raw.get("engine_volume").and_then(parse_engine_volume),
            engine_type: raw.get("fuel").and_then(fuel_to_engine_type),
            body_type: raw.get("body_type").map(str::to_string),
            drive_type: validate_drive_type(raw.get("drive_type"), &[]),
            transmission: normalize_transmission(raw.get("transmission"), MANUAL),
            mileage,
            location: raw.get("location").map(str::to_string),
            publication_date: publication_date(raw.get("publication_date"), today),
            description: raw.get("description").map(str::to_string),
            link: raw.link.clone(),
        })
    }
}
