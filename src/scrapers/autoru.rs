use crate::models::{NormalizedListing, RawListing, Source};
use crate::normalize::date::parse_day_month;
use crate::normalize::{
    first_word, normalize_transmission, parse_mileage, parse_price, plausible_year, required,
    split_title, validate_drive_type, Rejection,
};
use crate::scrapers::collector::{extract_card_links, paginate_by_url};
use crate::scrapers::traits::{ListingSource, Locator, PageDriver};
use crate::scrapers::types::CollectBudget;
use anyhow::Result;
use chrono::NaiveDate;
use std::time::Duration;

const SEARCH_URL: &str = "https://auto.ru/cars/used/";
const ORIGIN: &str = "https://auto.ru";
const CARD: &str = "div.ListingItem";
const CARD_LINK: &str = "a.ListingItemTitle__link";
const TITLE: &str = "//h1[@class='CardHead__title']";
const INFO: &str = "/html/body/div[1]/div/div[2]/div[3]/div/div[2]/div/div[2]/div/div[2]";
const WAIT: Duration = Duration::from_secs(10);

/// Term the site uses for a manual gearbox
const MANUAL: &str = "механическая";

/// Engine row with spaces removed reads "2.0л/150л.с./Бензин"
const ENGINE_UNSPECIFIED: &str = "Неуказано";

/// auto.ru: paginated search, fixed-layout card pages
pub struct Autoru;

/// Engine volume, power and fuel from one engine row
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSpec {
    /// Litres; electric cars list no volume
    pub volume: Option<f64>,
    pub power: Option<u32>,
    pub fuel: String,
}

/// "150л.с." -> 150
fn parse_power(segment: &str) -> Option<u32> {
    segment.strip_suffix("л.с.")?.parse().ok()
}

/// "2.0 л / 150 л.с. / Бензин" -> 2.0, 150, "Бензин"
///
/// The volume is only read from a leading segment in litres, so
/// "283 л.с. / Электро" gives no volume and 283 as power. The fuel is the
/// part after the last slash.
pub fn parse_engine(raw: &str) -> Option<EngineSpec> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == ENGINE_UNSPECIFIED {
        return None;
    }

    let segments: Vec<&str> = compact.split('/').collect();
    if segments.len() < 2 {
        return None;
    }
    let fuel = segments[segments.len() - 1];
    if fuel.is_empty() {
        return None;
    }

    let volume = segments[0]
        .strip_suffix('л')
        .and_then(|v| v.parse::<f64>().ok());
    let power = if volume.is_some() {
        parse_power(segments[1])
    } else {
        parse_power(segments[0])
    };

    Some(EngineSpec {
        volume,
        power,
        fuel: fuel.to_string(),
    })
}

fn info_row(li: usize, tail: &str) -> Locator {
    Locator::xpath(&format!("{INFO}/div[5]/div[1]/div[2]/ul[1]/li[{li}]/div[2]{tail}"))
}

impl ListingSource for Autoru {
    fn source(&self) -> Source {
        Source::Autoru
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
            |page| format!("{SEARCH_URL}?page={page}"),
            &Locator::css(CARD),
            WAIT,
            pause,
            |html| extract_card_links(html, CARD, CARD_LINK, ORIGIN),
        )
        .into_vec()
    }

    fn fetch_listing(&self, driver: &dyn PageDriver, url: &str) -> Result<RawListing> {
        let title = Locator::xpath(TITLE);
        driver.navigate(url)?;
        driver.wait_for(&title, WAIT)?;

        let price = Locator::xpath(&format!("{INFO}/div[1]/div[1]/div[2]/div/div[1]/span/span"));
        let description =
            Locator::xpath(&format!("{INFO}/div[7]/div[2]/div/div[1]/div/div/span"));
        let date = Locator::xpath(&format!("{INFO}/div[1]/div[1]/div[1]/div/div[1]"));

        let mut raw = RawListing::new(url);
        raw.extract("title", || driver.text(&title));
        raw.extract("price", || driver.text(&price));
        raw.extract("description", || driver.text(&description));
        raw.extract("engine_type", || driver.text(&info_row(7, "/div")));
        raw.extract("body_type", || driver.text(&info_row(5, "/a")));
        raw.extract("drive_type", || driver.text(&info_row(11, "")));
        raw.extract("transmission", || driver.text(&info_row(10, "")));
        raw.extract("mileage", || driver.text(&info_row(4, "")));
        raw.extract("location", || {
            driver.text(&Locator::css(".MetroListPlace__regionName"))
        });
        raw.extract("publication_date", || driver.text(&date));
        Ok(raw)
    }

    fn normalize(&self, raw: &RawListing, today: NaiveDate) -> Result<NormalizedListing, Rejection> {
        let title = required(raw, "title")?;
        let parts = split_title(title)
            .filter(|p| plausible_year(p.year, today))
            .ok_or_else(|| Rejection::unparseable("title", title))?;

        let price_text = required(raw, "price")?;
        let price = parse_price(price_text).ok_or_else(|| Rejection::unparseable("price", price_text))?;

        let engine_text = required(raw, "engine_type")?;
        let engine =
            parse_engine(engine_text).ok_or_else(|| Rejection::unparseable("engine_type", engine_text))?;
        let drive_text = required(raw, "drive_type")?;
        let drive_type = validate_drive_type(Some(drive_text), &[])
            .ok_or_else(|| Rejection::unparseable("drive_type", drive_text))?;

        let mileage_text = required(raw, "mileage")?;
        let mileage =
            parse_mileage(mileage_text).ok_or_else(|| Rejection::unparseable("mileage", mileage_text))?;

        Ok(NormalizedListing {
            brand: parts.brand,
            model: parts.model,
            year: parts.year,
            price,
            engine_volume: engine.volume,
            engine_type: Some(engine.fuel),
            body_type: first_word(raw.get("body_type")),
            drive_type: Some(drive_type),
            transmission: normalize_transmission(raw.get("transmission"), MANUAL),
            mileage,
            location: raw.get("location").map(str::to_string),
            publication_date: raw
                .get("publication_date")
                .and_then(|d| parse_day_month(d, today)),
            description: raw.get("description").map(str::to_string),
            link: raw.link.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DriveType, Transmission};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 20).unwrap()
    }

    fn listing() -> RawListing {
        RawListing::new("https://auto.ru/cars/used/sale/toyota/camry/1127/")
            .with("title", Some("Toyota Camry 2019,"))
            .with("price", Some("2 450 000 ₽"))
            .with("description", Some("Один владелец"))
            .with("engine_type", Some("2.5 л / 181 л.с. / Бензин"))
            .with("body_type", Some("Седан 4 дв."))
            .with("drive_type", Some("передний"))
            .with("transmission", Some("автоматическая"))
            .with("mileage", Some("85 000 км"))
            .with("location", Some("Москва"))
            .with("publication_date", Some("12 марта"))
    }

    #[test]
    fn engine_row() {
        let engine = parse_engine("2.0 л / 150 л.с. / Дизель").unwrap();
        assert_eq!(engine.volume, Some(2.0));
        assert_eq!(engine.power, Some(150));
        assert_eq!(engine.fuel, "Дизель");

        assert_eq!(parse_engine("Не указано"), None);
        assert_eq!(parse_engine("электро"), None);
    }

    #[test]
    fn electric_engine_row() {
        let engine = parse_engine("283 л.с. / Электро").unwrap();
        assert_eq!(engine.volume, None);
        assert_eq!(engine.power, Some(283));
        assert_eq!(engine.fuel, "Электро");

        let raw = listing().with("engine_type", Some("283 л.с. / Электро"));
        let row = Autoru.normalize(&raw, today()).unwrap();
        assert_eq!(row.engine_volume, None);
        assert_eq!(row.engine_type.as_deref(), Some("Электро"));
    }

    #[test]
    fn full_listing() {
        let row = Autoru.normalize(&listing(), today()).unwrap();
        assert_eq!(row.brand, "Toyota");
        assert_eq!(row.model, "Camry");
        assert_eq!(row.year, 2019);
        assert_eq!(row.price, 2_450_000);
        assert_eq!(row.engine_volume, Some(2.5));
        assert_eq!(row.engine_type.as_deref(), Some("Бензин"));
        assert_eq!(row.body_type.as_deref(), Some("Седан"));
        assert_eq!(row.drive_type, Some(DriveType::Front));
        assert_eq!(row.transmission, Transmission::Automatic);
        assert_eq!(row.mileage, 85_000);
        assert_eq!(row.publication_date, NaiveDate::from_ymd_opt(2025, 3, 12));
    }

    #[test]
    fn unknown_drive_type_drops_row() {
        let raw = listing().with("drive_type", Some("подвал"));
        assert_eq!(
            Autoru.normalize(&raw, today()),
            Err(Rejection::unparseable("drive_type", "подвал"))
        );

        let raw = listing().with("drive_type", None);
        assert_eq!(
            Autoru.normalize(&raw, today()),
            Err(Rejection::Missing("drive_type"))
        );
    }

    #[test]
    fn unspecified_engine_drops_row() {
        let raw = listing().with("engine_type", None);
        assert_eq!(
            Autoru.normalize(&raw, today()),
            Err(Rejection::Missing("engine_type"))
        );

        let raw = listing().with("engine_type", Some("электро"));
        assert_eq!(
            Autoru.normalize(&raw, today()),
            Err(Rejection::unparseable("engine_type", "электро"))
        );
    }

    #[test]
    fn unparseable_date_is_null() {
        let raw = listing().with("publication_date", Some("давно"));
        assert_eq!(Autoru.normalize(&raw, today()).unwrap().publication_date, None);
    }
}
