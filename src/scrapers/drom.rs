use crate::models::{DriveType, NormalizedListing, RawListing, Source};
use crate::normalize::date::parse_labelled;
use crate::normalize::{
    normalize_transmission, parse_mileage, parse_price, plausible_year, required,
    validate_drive_type, Rejection, TitleParts,
};
use crate::scrapers::collector::paginate_by_next;
use crate::scrapers::traits::{ListingSource, Locator, PageDriver};
use crate::scrapers::types::CollectBudget;
use anyhow::Result;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::warn;

const SEARCH_URL: &str = "https://auto.drom.ru/used/all/";
const ANCHORS: &str = r#"a[data-ftid="bull_title"]"#;
const NEXT_PAGE: &str = r#"a[data-ftid="component_pagination-item-next"]"#;
const TITLE: &str = "h1 span.css-1kb7l9z";
const CARD: &str = "/html/body/div[2]/div[4]/div[1]/div[1]/div[2]";
const LIST_WAIT: Duration = Duration::from_secs(10);
const TITLE_WAIT: Duration = Duration::from_secs(5);

const MANUAL: &str = "механика";
const DRIVE_ALIASES: [(&str, DriveType); 1] = [("4WD", DriveType::AllWheel)];

/// drom.ru: "next page" pagination, labelled spec table
pub struct Drom;

/// "Продажа Toyota Camry, 2019 год в Москве"
///
/// The brand is the second word and the model the third, commas removed;
/// the year is the first four digits after the first comma.
pub fn parse_title(title: &str) -> Option<TitleParts> {
    let words: Vec<&str> = title.split_whitespace().collect();
    let brand = words.get(1)?.to_string();
    let model: String = words.get(2)?.chars().filter(|c| *c != ',').collect();
    if model.is_empty() {
        return None;
    }

    let (_, after_comma) = title.split_once(',')?;
    let digits: String = after_comma
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(4)
        .collect();
    if digits.len() != 4 {
        return None;
    }

    Some(TitleParts {
        brand,
        model,
        year: digits.parse().ok()?,
    })
}

/// "бензин, 2.5 л" -> ("бензин", 2.5)
pub fn parse_engine(raw: &str) -> Option<(String, f64)> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parts = compact.split(',');
    let fuel = parts.next().filter(|f| !f.is_empty())?.to_string();
    let volume = parts.next()?.trim_end_matches('л').parse().ok()?;
    Some((fuel, volume))
}

/// "85 000 км, без пробега по РФ" -> 85000
fn parse_drom_mileage(raw: &str) -> Option<i64> {
    parse_mileage(raw.split(',').next()?)
}

impl ListingSource for Drom {
    fn source(&self) -> Source {
        Source::Drom
    }

    fn default_budget(&self) -> CollectBudget {
        CollectBudget::pages(1)
    }

    fn collect_links(
        &self,
        driver: &dyn PageDriver,
        budget: &CollectBudget,
        pause: Duration,
    ) -> Vec<String> {
        match paginate_by_next(
            driver,
            SEARCH_URL,
            budget.pages,
            ANCHORS,
            &Locator::css(NEXT_PAGE),
            LIST_WAIT,
            pause,
        ) {
            Ok(links) => links.into_vec(),
            Err(e) => {
                warn!("[drom] Search page unavailable: {:#}", e);
                Vec::new()
            }
        }
    }

    fn fetch_listing(&self, driver: &dyn PageDriver, url: &str) -> Result<RawListing> {
        driver.navigate(url)?;

        let title = Locator::css(TITLE);
        let mut raw = RawListing::new(url);
        raw.extract("title", || {
            driver.wait_for(&title, TITLE_WAIT)?;
            driver.text(&title)
        });
        raw.extract("price", || {
            driver.text(&Locator::xpath(&format!("{CARD}/div[2]/div[1]/div/div[1]")))
        });
        raw.extract("description", || {
            driver.text(&Locator::xpath(&format!("{CARD}/div[2]/div[4]/div[1]/span[2]")))
        });
        raw.extract("engine", || driver.text(&Locator::css("td.css-1azz3as.eka0pcn0")));
        raw.extract("transmission", || {
            driver.text(&Locator::labelled("th", "Коробка передач", "td"))
        });
        raw.extract("mileage", || driver.text(&Locator::labelled("th", "Пробег", "td")));
        raw.extract("power", || {
            let text = driver.text(&Locator::css("span.css-gy2hs8.e162wx9x0"))?;
            Ok(text.split_whitespace().next().unwrap_or_default().to_string())
        });
        raw.extract("body_type", || driver.text(&Locator::labelled("th", "Кузов", "td")));
        raw.extract("drive_type", || driver.text(&Locator::labelled("th", "Привод", "td")));
        raw.extract("location", || {
            driver.text(&Locator::xpath(&format!("{CARD}/div[2]/div[4]/div[2]")))
        });
        raw.extract("publication_date", || {
            driver.text(&Locator::xpath(&format!("{CARD}/div[1]/div[4]/div/div[1]")))
        });
        Ok(raw)
    }

    fn normalize(&self, raw: &RawListing, today: NaiveDate) -> Result<NormalizedListing, Rejection> {
        let title = required(raw, "title")?;
        let parts = parse_title(title)
            .filter(|p| plausible_year(p.year, today))
            .ok_or_else(|| Rejection::unparseable("title", title))?;

        let price_text = required(raw, "price")?;
        let price = parse_price(price_text).ok_or_else(|| Rejection::unparseable("price", price_text))?;

        let mileage_text = required(raw, "mileage")?;
        let mileage = parse_drom_mileage(mileage_text)
            .ok_or_else(|| Rejection::unparseable("mileage", mileage_text))?;

        let (engine_type, engine_volume) = raw.get("engine").and_then(parse_engine).unzip();

        Ok(NormalizedListing {
            brand: parts.brand,
            model: parts.model,
            year: parts.year,
            price,
            engine_volume,
            engine_type,
            body_type: raw.get("body_type").map(str::to_string),
            drive_type: validate_drive_type(raw.get("drive_type"), &DRIVE_ALIASES),
            transmission: normalize_transmission(raw.get("transmission"), MANUAL),
            mileage,
            location: raw.get("location").map(str::to_string),
            publication_date: raw
                .get("publication_date")
                .and_then(|d| parse_labelled(d, " от ", "%d.%m.%Y")),
            description: raw.get("description").map(str::to_string),
            link: raw.link.clone(),
        })
    }
}
