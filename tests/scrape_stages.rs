// tests/scrape_stages.rs
//
// Collectors and fetchers driven through an in-memory page driver.
//
use anyhow::{anyhow, Result};
use car_scout::models::{Source, UNSPECIFIED};
use car_scout::scrapers::{fetcher, listing_source, CollectBudget, Locator, PageDriver};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Default, Clone)]
struct FakePage {
    texts: HashMap<Locator, String>,
    lists: HashMap<Locator, Vec<String>>,
    hrefs: HashMap<String, Vec<String>>,
    clicks: HashMap<Locator, String>,
    html: String,
    /// Anchors revealed by each successive scroll
    scroll_batches: Vec<Vec<String>>,
}

impl FakePage {
    fn text(mut self, locator: Locator, value: &str) -> Self {
        self.texts.insert(locator, value.to_string());
        self
    }

    fn anchors(mut self, css: &str, links: &[&str]) -> Self {
        self.hrefs
            .insert(css.to_string(), links.iter().map(|l| l.to_string()).collect());
        self
    }

    fn click_to(mut self, locator: Locator, url: &str) -> Self {
        self.clicks.insert(locator, url.to_string());
        self
    }
}

#[derive(Default)]
struct FakeDriver {
    pages: HashMap<String, FakePage>,
    current: RefCell<Option<String>>,
    scrolls: Cell<usize>,
    visited: RefCell<Vec<String>>,
}

impl FakeDriver {
    fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    fn current(&self) -> Result<FakePage> {
        let url = self.current.borrow().clone().ok_or_else(|| anyhow!("no page open"))?;
        Ok(self.pages[&url].clone())
    }
}

impl PageDriver for FakeDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        self.visited.borrow_mut().push(url.to_string());
        if !self.pages.contains_key(url) {
            return Err(anyhow!("net::ERR_CONNECTION_RESET at {url}"));
        }
        *self.current.borrow_mut() = Some(url.to_string());
        self.scrolls.set(0);
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<()> {
        let page = self.current()?;
        let css_present = match locator {
            Locator::Css(css) => page.hrefs.contains_key(css) || !page.html.is_empty(),
            Locator::XPath(_) => false,
        };
        if page.texts.contains_key(locator)
            || page.lists.contains_key(locator)
            || page.clicks.contains_key(locator)
            || css_present
        {
            Ok(())
        } else {
            Err(anyhow!("timed out waiting for {locator}"))
        }
    }

    fn text(&self, locator: &Locator) -> Result<String> {
        self.current()?
            .texts
            .get(locator)
            .cloned()
            .ok_or_else(|| anyhow!("no element {locator}"))
    }

    fn texts(&self, locator: &Locator) -> Result<Vec<String>> {
        Ok(self.current()?.lists.get(locator).cloned().unwrap_or_default())
    }

    fn hrefs(&self, selector: &str) -> Result<Vec<String>> {
        let page = self.current()?;
        if !page.scroll_batches.is_empty() {
            let shown = self.scrolls.get().min(page.scroll_batches.len());
            return Ok(page.scroll_batches[..shown].concat());
        }
        page.hrefs
            .get(selector)
            .cloned()
            .ok_or_else(|| anyhow!("no anchors {selector}"))
    }

    fn click(&self, locator: &Locator) -> Result<()> {
        let target = self
            .current()?
            .clicks
            .get(locator)
            .cloned()
            .ok_or_else(|| anyhow!("nothing to click at {locator}"))?;
        self.navigate(&target)
    }

    fn html(&self) -> Result<String> {
        Ok(self.current()?.html)
    }

    fn scroll_to(&self, _y: f64) -> Result<()> {
        self.scrolls.set(self.scrolls.get() + 1);
        Ok(())
    }

    fn viewport_height(&self) -> Result<f64> {
        Ok(900.0)
    }
}

const DROM_ANCHORS: &str = r#"a[data-ftid="bull_title"]"#;
const DROM_NEXT: &str = r#"a[data-ftid="component_pagination-item-next"]"#;

#[test]
fn drom_follows_next_page_until_it_disappears() {
    let driver = FakeDriver::default()
        .page(
            "https://auto.drom.ru/used/all/",
            FakePage::default()
                .anchors(DROM_ANCHORS, &["https://d/1", "https://d/2", "https://d/1"])
                .click_to(Locator::css(DROM_NEXT), "https://auto.drom.ru/used/all/page2/"),
        )
        .page(
            "https://auto.drom.ru/used/all/page2/",
            FakePage::default().anchors(DROM_ANCHORS, &["https://d/2", "https://d/3"]),
        );

    let links = listing_source(Source::Drom).collect_links(
        &driver,
        &CollectBudget::pages(5),
        Duration::ZERO,
    );

    assert_eq!(links, ["https://d/1", "https://d/2", "https://d/3"]);
}

#[test]
fn avito_skips_a_page_that_fails_to_load() {
    let base = "https://www.avito.ru/all/avtomobili/s_probegom-ASgBAgICAUSGFMjmAQ";
    let card = |href: &str| {
        format!(r#"<div data-marker="item"><a data-marker="item-title" href="{href}">car</a></div>"#)
    };

    let driver = FakeDriver::default()
        .page(
            &format!("{base}?p=1"),
            FakePage {
                html: format!("{}{}", card("/moskva/avtomobili/a_1"), card("/moskva/avtomobili/b_2")),
                ..Default::default()
            },
        )
        .page(
            &format!("{base}?p=3"),
            FakePage {
                html: format!("{}{}", card("/moskva/avtomobili/b_2"), card("/kazan/avtomobili/c_3")),
                ..Default::default()
            },
        );

    let links = listing_source(Source::Avito).collect_links(
        &driver,
        &CollectBudget::pages(3),
        Duration::ZERO,
    );

    assert_eq!(driver.visited.borrow().len(), 3);
    assert_eq!(
        links,
        [
            "https://www.avito.ru/moskva/avtomobili/a_1",
            "https://www.avito.ru/moskva/avtomobili/b_2",
            "https://www.avito.ru/kazan/avtomobili/c_3",
        ]
    );
}

#[test]
fn youla_scrolls_until_target_reached() {
    let feed = FakePage {
        scroll_batches: vec![
            vec!["https://y/1".into(), "https://y/2".into()],
            vec!["https://y/2".into(), "https://y/3".into()],
            vec!["https://y/4".into()],
        ],
        ..Default::default()
    };
    let driver = FakeDriver::default().page("https://youla.ru/moskva/auto/s-probegom", feed);

    let links = listing_source(Source::Youla).collect_links(
        &driver,
        &CollectBudget::scroll(3, 10),
        Duration::ZERO,
    );

    assert_eq!(links, ["https://y/1", "https://y/2", "https://y/3"]);
    assert_eq!(driver.scrolls.get(), 2);
}

#[test]
fn youla_scroll_cap_ends_a_dry_feed() {
    let feed = FakePage {
        scroll_batches: vec![vec!["https://y/1".into()]],
        ..Default::default()
    };
    let driver = FakeDriver::default().page("https://youla.ru/moskva/auto/s-probegom", feed);

    let links = listing_source(Source::Youla).collect_links(
        &driver,
        &CollectBudget::scroll(50, 4),
        Duration::ZERO,
    );

    assert_eq!(links, ["https://y/1"]);
    assert_eq!(driver.scrolls.get(), 4);
}

fn dd(label: &str) -> Locator {
    Locator::labelled("dt", label, "dd")
}

#[test]
fn fetcher_substitutes_missing_fields_and_skips_dead_links() {
    let full = FakePage::default()
        .text(Locator::css(r#"h2[data-test-block="ProductCaption"]"#), "Kia Rio, 2017")
        .text(Locator::css("span.sc-fxhZON.fzJDlO"), "890 000 ₽")
        .text(dd("Пробег"), "120 000 км")
        .text(dd("Коробка передач"), "Механика");
    let sparse = FakePage::default()
        .text(Locator::css(r#"h2[data-test-block="ProductCaption"]"#), "Lada Vesta, 2020");

    let driver = FakeDriver::default()
        .page("https://youla.ru/moskva/auto/a", full)
        .page("https://youla.ru/moskva/auto/b", sparse);
    let links = vec![
        "https://youla.ru/moskva/auto/a".to_string(),
        "https://youla.ru/moskva/auto/gone".to_string(),
        "https://youla.ru/moskva/auto/b".to_string(),
    ];

    let listings = fetcher::fetch_all(listing_source(Source::Youla), &driver, &links, Duration::ZERO);

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].get("mileage"), Some("120 000 км"));
    assert_eq!(listings[1].link, "https://youla.ru/moskva/auto/b");
    assert_eq!(listings[1].get("price"), None);
    assert_eq!(listings[1].get("title"), Some("Lada Vesta, 2020"));

    let json = serde_json::to_string(&listings[1]).unwrap();
    assert!(json.contains(&format!(r#""price":"{UNSPECIFIED}""#)));
    assert!(json.ends_with(r#""link":"https://youla.ru/moskva/auto/b"}"#));
}

#[test]
fn avito_listing_without_title_is_skipped() {
    let untitled = FakePage::default().text(
        Locator::xpath("//div[@data-marker='item-view/item-description']"),
        "Продаю",
    );
    let mut titled = FakePage::default()
        .text(Locator::xpath("//h1[@itemprop='name']"), "Kia Rio 1.6 MT, 2017, 120 000 км");
    titled.lists.insert(
        Locator::xpath("//li"),
        vec!["Коробка передач: механика".into(), "Привод: передний".into()],
    );

    let driver = FakeDriver::default()
        .page("https://www.avito.ru/x", untitled)
        .page("https://www.avito.ru/y", titled);
    let links = vec!["https://www.avito.ru/x".to_string(), "https://www.avito.ru/y".to_string()];

    let listings = fetcher::fetch_all(listing_source(Source::Avito), &driver, &links, Duration::ZERO);

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].get("transmission"), Some("механика"));
    assert_eq!(listings[0].get("drive_type"), Some("передний"));
    assert_eq!(listings[0].get("engine_type"), None);
}
