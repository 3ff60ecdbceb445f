//! Publication dates as the sites print them.

use chrono::{Datelike, Duration, NaiveDate};

/// Genitive month names as they appear in "12 марта"
const MONTHS: [(&str, &str); 12] = [
    ("января", "01"),
    ("февраля", "02"),
    ("марта", "03"),
    ("апреля", "04"),
    ("мая", "05"),
    ("июня", "06"),
    ("июля", "07"),
    ("августа", "08"),
    ("сентября", "09"),
    ("октября", "10"),
    ("ноября", "11"),
    ("декабря", "12"),
];

fn month_number(name: &str) -> Option<&'static str> {
    let name = name.trim_matches(',').to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

/// "сегодня в 14:20" and "вчера" relative to `today`
fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let first = text.split_whitespace().next()?.trim_matches(',').to_lowercase();
    match first.as_str() {
        "сегодня" => Some(today),
        "вчера" => Some(today - Duration::days(1)),
        _ => None,
    }
}

/// Parses "12 марта", "12 марта 2024" or a relative word.
///
/// A date without a year takes the year of `today`, or the year before when
/// that would place it in the future or does not exist in the current year.
/// Anything else yields `None`.
pub fn parse_day_month(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(date) = parse_relative(text, today) {
        return Some(date);
    }

    let mut words = text.split_whitespace();
    let day: u32 = words.next()?.parse().ok()?;
    let month = month_number(words.next()?)?;
    let explicit_year = words
        .next()
        .map(|w| w.trim_matches(','))
        .filter(|w| w.len() == 4 && w.chars().all(|c| c.is_ascii_digit()));

    let on = |year: &str| {
        NaiveDate::parse_from_str(&format!("{day:02}-{month}-{year}"), "%d-%m-%Y").ok()
    };
    if let Some(year) = explicit_year {
        return on(year);
    }

    // A future date, or "29 февраля" in a common year, belongs to last year
    match on(&today.year().to_string()) {
        Some(date) if date <= today => Some(date),
        _ => on(&(today.year() - 1).to_string()),
    }
}
