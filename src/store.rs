//! JSON files handed from one stage to the next.

use crate::models::{RawListing, Source};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn links_path(data_dir: &Path, source: Source) -> PathBuf {
    data_dir.join(format!("{}_links.json", source.name()))
}

pub fn raw_path(data_dir: &Path, source: Source) -> PathBuf {
    data_dir.join(format!("{}_data.json", source.name()))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed JSON in {}", path.display()))
}

pub async fn write_links(data_dir: &Path, source: Source, links: &[String]) -> Result<PathBuf> {
    let path = links_path(data_dir, source);
    write_json(&path, links).await?;
    Ok(path)
}

pub async fn read_links(data_dir: &Path, source: Source) -> Result<Vec<String>> {
    read_json(&links_path(data_dir, source)).await
}

pub async fn write_raw(data_dir: &Path, source: Source, listings: &[RawListing]) -> Result<PathBuf> {
    let path = raw_path(data_dir, source);
    write_json(&path, listings).await?;
    Ok(path)
}

pub async fn read_raw(data_dir: &Path, source: Source) -> Result<Vec<RawListing>> {
    read_json(&raw_path(data_dir, source)).await
}
