use crate::models::{NormalizedListing, RawListing, Source};
use crate::normalize::{
    first_word, normalize_transmission, parse_price, plausible_year, required, validate_drive_type,
    Rejection,
};
use crate::scrapers::collector::{extract_card_links, paginate_by_url};
use crate::scrapers::fetcher::labelled_value;
use crate::scrapers::traits::{ListingSource, Locator, PageDriver};
use crate::scrapers::types::CollectBudget;
use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

const SEARCH_URL: &str = "https://www.avito.ru/all/avtomobili/s_probegom-ASgBAgICAUSGFMjmAQ";
const ORIGIN: &str = "https://www.avito.ru";
const CARD: &str = "div[data-marker='item']";
const CARD_LINK: &str = "a[data-marker='item-title']";
const TITLE: &str = "//h1[@itemprop='name']";
const PRICE: &str = "/html/body/div[1]/div/div[3]/div[1]/div/div[2]/div[3]/div/div[2]/div[1]/div/div/div[1]/div/div[1]/div/div[1]/div/span/span/span[1]";
const LOCATION: &str = "/html/body/div[1]/div/div[3]/div[1]/div/div[2]/div[3]/div/div[1]/div[2]/div[4]/div/div[1]/div[1]/div/span";
const LIST_WAIT: Duration = Duration::from_secs(10);
const TITLE_WAIT: Duration = Duration::from_secs(5);

const MANUAL: &str = "Механика";

/// Labelled rows of the car parameters list
const PARAMS: [(&str, &str); 4] = [
    ("engine_type", "Тип двигателя:"),
    ("drive_type", "Привод:"),
    ("body_type", "Тип кузова:"),
    ("transmission", "Коробка передач:"),
];

static ENGINE_VOLUME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("valid regex"));
static MILEAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:\s?\d{3})?\s?км").expect("valid regex"));

/// avito.ru: paginated search, car parameters as labelled list items
pub struct Avito;

/// Everything the avito card title carries
#[derive(Debug, Clone, PartialEq)]
pub struct TitleSpec {
    pub brand: String,
    pub model: String,
    pub engine_volume: f64,
    pub year: i32,
    pub mileage: Option<i64>,
}

/// "Toyota Camry 2.5 AT, 2019, 85 000 км"
///
/// The year must be the second-to-last comma segment and exactly four
/// characters long; otherwise the title is rejected as a whole.
pub fn parse_title(title: &str) -> Option<TitleSpec> {
    let brand = title.split_whitespace().next()?.to_string();

    let segments: Vec<&str> = title.split(',').collect();
    if segments.len() < 2 {
        return None;
    }
    let year_text = segments[segments.len() - 2].trim();
    if year_text.chars().count() != 4 {
        return None;
    }
    let year = year_text.parse().ok()?;

    let volume_text = ENGINE_VOLUME.find(title)?.as_str();
    let engine_volume = volume_text.parse().ok()?;
    let (_, after_brand) = title.trim_start().split_once(char::is_whitespace)?;
    let model = after_brand
        .split(volume_text)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    if model.is_empty() {
        return None;
    }

    let mileage = MILEAGE.find(title).and_then(|m| {
        m.as_str()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .ok()
    });

    Some(TitleSpec {
        brand,
        model,
        engine_volume,
        year,
        mileage,
    })
}

impl ListingSource for Avito {
    fn source(&self) -> Source {
        Source::Avito
    }

    fn default_budget(&self) -> CollectBudget {
        CollectBudget::pages(3)
    }

    fn collect_links(
        &self,
        driver: &dyn PageDriver,
        budget: &CollectBudget,
        pause: Duration,
    ) -> Vec<String> {
        paginate_by_url(
            driver,
            budget.pages,
            |page| format!("{SEARCH_URL}?p={page}"),
            &Locator::css(CARD),
            LIST_WAIT,
            pause,
            |html| extract_card_links(html, CARD, CARD_LINK, ORIGIN),
        )
        .into_vec()
    }

    fn fetch_listing(&self, driver: &dyn PageDriver, url: &str) -> Result<RawListing> {
        let title = Locator::xpath(TITLE);
        driver.navigate(url)?;
        driver.wait_for(&title, TITLE_WAIT)?;
        let title_text = driver.text(&title)?;

        let mut raw = RawListing::new(url);
        raw.set("title", Some(title_text.trim().to_string()));
        raw.extract("price", || driver.text(&Locator::xpath(PRICE)));
        raw.extract("description", || {
            driver.text(&Locator::xpath(
                "//div[@data-marker='item-view/item-description']",
            ))
        });

        let items = driver.texts(&Locator::xpath("//li")).unwrap_or_default();
        for (name, label) in PARAMS {
            raw.set(name, labelled_value(&items, label));
        }

        raw.extract("location", || driver.text(&Locator::xpath(LOCATION)));
        raw.extract("publication_date", || {
            driver.text(&Locator::xpath("//span[@data-marker='item-view/item-date']"))
        });
        Ok(raw)
    }

    /// The page shows no usable publication date, so the run day stands in.
    fn normalize(&self, raw: &RawListing, today: NaiveDate) -> Result<NormalizedListing, Rejection> {
        let title = required(raw, "title")?;
        let spec = parse_title(title)
            .filter(|s| plausible_year(s.year, today))
            .ok_or_else(|| Rejection::unparseable("title", title))?;
        let mileage = spec.mileage.ok_or(Rejection::Missing("mileage"))?;

        let price_text = required(raw, "price")?;
        let price = parse_price(price_text).ok_or_else(|| Rejection::unparseable("price", price_text))?;

        Ok(NormalizedListing {
            brand: spec.brand,
            model: spec.model,
            year: spec.year,
            price,
            engine_volume: Some(spec.engine_volume),
            engine_type: raw.get("engine_type").map(str::to_string),
            body_type: first_word(raw.get("body_type")),
            drive_type: validate_drive_type(raw.get("drive_type"), &[]),
            transmission: normalize_transmission(raw.get("transmission"), MANUAL),
            mileage,
            location: raw.get("location").map(str::to_string),
            publication_date: Some(today),
            description: raw.get("description").map(str::to_string),
            link: raw.link.clone(),
        })
    }
}
