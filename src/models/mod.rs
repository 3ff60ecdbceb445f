mod raw;

pub use raw::{RawListing, UNSPECIFIED};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifieds site a listing was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Source {
    Autoru,
    Avito,
    Drom,
    Youla,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Autoru, Source::Avito, Source::Drom, Source::Youla];

    /// Name used for the destination table and the intermediate file prefix
    pub fn name(self) -> &'static str {
        match self {
            Source::Autoru => "autoru",
            Source::Avito => "avito",
            Source::Drom => "drom",
            Source::Youla => "youla",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drive type, rendered with the localized vocabulary the sites use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DriveType {
    #[serde(rename = "передний")]
    Front,
    #[serde(rename = "задний")]
    Rear,
    #[serde(rename = "полный")]
    AllWheel,
}

impl DriveType {
    pub fn as_str(self) -> &'static str {
        match self {
            DriveType::Front => "передний",
            DriveType::Rear => "задний",
            DriveType::AllWheel => "полный",
        }
    }

    /// Matches the canonical localized term, ignoring case
    pub fn from_localized(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "передний" => Some(DriveType::Front),
            "задний" => Some(DriveType::Rear),
            "полный" => Some(DriveType::AllWheel),
            _ => None,
        }
    }
}

/// Gearbox; anything not manual counts as automatic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Transmission {
    #[serde(rename = "механическая")]
    Manual,
    #[serde(rename = "автоматическая")]
    Automatic,
}

impl Transmission {
    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Manual => "механическая",
            Transmission::Automatic => "автоматическая",
        }
    }
}

/// Typed car listing, ready for the destination table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedListing {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub engine_volume: Option<f64>,
    pub engine_type: Option<String>,
    pub body_type: Option<String>,
    pub drive_type: Option<DriveType>,
    pub transmission: Transmission,
    pub mileage: i64,
    pub location: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub link: String,
}

impl NormalizedListing {
    /// Lowercases every text column except the link.
    pub fn lowercased(self) -> Self {
        fn lower(value: Option<String>) -> Option<String> {
            value.map(|v| v.to_lowercase())
        }

        Self {
            brand: self.brand.to_lowercase(),
            model: self.model.to_lowercase(),
            engine_type: lower(self.engine_type),
            body_type: lower(self.body_type),
            location: lower(self.location),
            description: lower(self.description),
            ..self
        }
    }
}
