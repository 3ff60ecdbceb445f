//! Used-car listing scraper: per-site link collection, detail extraction,
//! field normalization and a full-replace table load.

pub mod config;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scrapers;
pub mod sink;
pub mod store;
