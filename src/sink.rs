//! Full-replace writes of normalized listings into a relational table.

use crate::models::NormalizedListing;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid table name {0:?}")]
    InvalidTableName(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Column names, in table order
pub const COLUMNS: [&str; 14] = [
    "brand",
    "model",
    "year",
    "price",
    "engine_volume",
    "engine_type",
    "body_type",
    "drive_type",
    "transmission",
    "mileage",
    "location",
    "publication_date",
    "description",
    "link",
];

fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

/// One listing as SQL values, matching [`COLUMNS`]
pub fn row_values(listing: &NormalizedListing) -> Vec<Value> {
    vec![
        Value::Text(listing.brand.clone()),
        Value::Text(listing.model.clone()),
        Value::Integer(listing.year.into()),
        Value::Integer(listing.price),
        listing.engine_volume.map_or(Value::Null, Value::Real),
        text(listing.engine_type.as_deref()),
        text(listing.body_type.as_deref()),
        text(listing.drive_type.map(|d| d.as_str())),
        Value::Text(listing.transmission.as_str().to_string()),
        Value::Integer(listing.mileage),
        text(listing.location.as_deref()),
        listing
            .publication_date
            .map_or(Value::Null, |d| Value::Text(d.format("%Y-%m-%d").to_string())),
        text(listing.description.as_deref()),
        Value::Text(listing.link.clone()),
    ]
}

/// SQL type for a column, taken from the values actually being written.
///
/// Integers widen to REAL when mixed with floats; anything else, including
/// an all-null column, is TEXT.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> &'static str {
    let mut kind = None;
    for value in values {
        let this = match value {
            Value::Null => continue,
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            _ => "TEXT",
        };
        kind = match (kind, this) {
            (None, t) => Some(t),
            (Some(a), b) if a == b => Some(a),
            (Some("INTEGER"), "REAL") | (Some("REAL"), "INTEGER") => Some("REAL"),
            _ => Some("TEXT"),
        };
    }
    kind.unwrap_or("TEXT")
}

fn check_table_name(table: &str) -> Result<(), SinkError> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        Ok(())
    } else {
        Err(SinkError::InvalidTableName(table.to_string()))
    }
}

/// SQLite destination; one connection per load, released on every path
#[derive(Debug, Clone)]
pub struct TableSink {
    path: PathBuf,
}

impl TableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            // A missing directory surfaces as an open error below
            let _ = std::fs::create_dir_all(parent);
        }
        Ok(Connection::open(&self.path)?)
    }

    /// Drops `table` and recreates it holding exactly `listings`.
    ///
    /// Failures are logged; the return value says whether the load happened.
    pub fn replace(&self, table: &str, listings: &[NormalizedListing]) -> bool {
        info!("Loading {} rows into table '{}'", listings.len(), table);

        match self.try_replace(table, listings) {
            Ok(count) => {
                info!("Table '{}' now holds {} rows", table, count);
                true
            }
            Err(e) => {
                error!("Failed to load table '{}': {}", table, e);
                false
            }
        }
    }

    /// Drop, create and insert run in one transaction, so readers never see
    /// a half-written table.
    pub fn try_replace(&self, table: &str, listings: &[NormalizedListing]) -> Result<usize, SinkError> {
        check_table_name(table)?;

        let rows: Vec<Vec<Value>> = listings.iter().map(row_values).collect();
        let definitions: Vec<String> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = infer_column_type(rows.iter().map(|row| &row[i]));
                format!("\"{name}\" {kind}")
            })
            .collect();

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS \"{table}\""), [])?;
        tx.execute(
            &format!("CREATE TABLE \"{table}\" ({})", definitions.join(", ")),
            [],
        )?;
        {
            let placeholders = vec!["?"; COLUMNS.len()].join(", ");
            let mut insert =
                tx.prepare(&format!("INSERT INTO \"{table}\" VALUES ({placeholders})"))?;
            for row in &rows {
                insert.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Number of rows currently in `table`
    pub fn row_count(&self, table: &str) -> Result<i64, SinkError> {
        check_table_name(table)?;
        let conn = self.connect()?;
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |r| r.get(0))?)
    }
}
