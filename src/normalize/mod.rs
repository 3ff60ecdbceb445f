//! Text cleaning shared by the per-site normalizers.
//!
//! Every function here is pure: raw page text in, typed value (or `None`) out.

pub mod date;

use crate::models::{DriveType, NormalizedListing, RawListing, Source, Transmission};
use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

/// Why a raw listing was kept out of the normalized set
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Rejection {
    #[error("required field `{0}` is missing")]
    Missing(&'static str),
    #[error("field `{field}` could not be parsed from {value:?}")]
    Unparseable { field: &'static str, value: String },
}

impl Rejection {
    pub fn unparseable(field: &'static str, value: &str) -> Self {
        Rejection::Unparseable {
            field,
            value: value.to_string(),
        }
    }
}

/// Reads a field that must be present for the row to be admitted
pub fn required<'a>(raw: &'a RawListing, field: &'static str) -> Result<&'a str, Rejection> {
    raw.get(field).ok_or(Rejection::Missing(field))
}

/// Brand, model and year pulled out of a listing title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts {
    pub brand: String,
    pub model: String,
    pub year: i32,
}

/// Splits "<Brand> <Model words> <Year>," into its parts.
///
/// The first word is the brand, the last word (commas trimmed) the year and
/// everything between, joined by single spaces, the model.
pub fn split_title(title: &str) -> Option<TitleParts> {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() < 3 {
        return None;
    }

    let brand = words[0].to_string();
    let model = words[1..words.len() - 1]
        .join(" ")
        .trim_matches(',')
        .trim()
        .to_string();
    let year = words[words.len() - 1].trim_matches(',').parse().ok()?;

    if model.is_empty() {
        return None;
    }
    Some(TitleParts { brand, model, year })
}

/// Model years outside 1900..=next year are treated as garbage
pub fn plausible_year(year: i32, today: NaiveDate) -> bool {
    (1900..=today.year() + 1).contains(&year)
}

/// "1 200 000 ₽" -> 1200000
pub fn parse_price(raw: &str) -> Option<i64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.trim_end_matches('₽');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Keeps only the digits: "85 000 км" -> 85000
pub fn parse_mileage(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Exactly `manual_term` is manual; everything else, unspecified included,
/// is automatic.
pub fn normalize_transmission(raw: Option<&str>, manual_term: &str) -> Transmission {
    match raw {
        Some(value) if value == manual_term => Transmission::Manual,
        _ => Transmission::Automatic,
    }
}

/// Accepts the localized drive vocabulary plus site-specific aliases.
pub fn validate_drive_type(raw: Option<&str>, aliases: &[(&str, DriveType)]) -> Option<DriveType> {
    let value = raw?.trim();
    aliases
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(value))
        .map(|(_, drive)| *drive)
        .or_else(|| DriveType::from_localized(value))
}

/// "Седан 4 дв." -> "Седан"
pub fn first_word(raw: Option<&str>) -> Option<String> {
    raw?.split_whitespace().next().map(str::to_string)
}

/// Result of normalizing one source's raw records
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub listings: Vec<NormalizedListing>,
    pub rejected: usize,
}

/// Runs `normalize` over every raw record, dropping the rejected ones.
///
/// Admitted rows are lowercased before they are returned.
pub fn normalize_all<F>(source: Source, raws: &[RawListing], normalize: F) -> NormalizeReport
where
    F: Fn(&RawListing) -> Result<NormalizedListing, Rejection>,
{
    let mut report = NormalizeReport::default();

    for raw in raws {
        match normalize(raw) {
            Ok(listing) => report.listings.push(listing.lowercased()),
            Err(reason) => {
                warn!("[{}] dropping {}: {}", source, raw.link, reason);
                report.rejected += 1;
            }
        }
    }

    info!(
        "[{}] admitted {} rows, rejected {}",
        source,
        report.listings.len(),
        report.rejected
    );
    report
}
