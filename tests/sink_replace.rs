// tests/sink_replace.rs
//
// The sink replaces a table wholesale; loading twice never accumulates rows.
//
use car_scout::models::{DriveType, NormalizedListing, Transmission};
use car_scout::sink::TableSink;
use chrono::NaiveDate;
use rusqlite::Connection;

fn listing(n: i64) -> NormalizedListing {
    NormalizedListing {
        brand: "kia".into(),
        model: "rio".into(),
        year: 2017,
        price: 800_000 + n,
        engine_volume: Some(1.6),
        engine_type: Some("бензин".into()),
        body_type: Some("седан".into()),
        drive_type: Some(DriveType::Front),
        transmission: Transmission::Manual,
        mileage: 100_000 + n,
        location: None,
        publication_date: NaiveDate::from_ymd_opt(2025, 3, 12),
        description: None,
        link: format!("https://youla.ru/moskva/auto/Kia-{n}"),
    }
}

type Row = (String, i64, Option<f64>, Option<String>, String, Option<String>);

fn dump(path: &std::path::Path, table: &str) -> Vec<Row> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(&format!(
            "SELECT brand, price, engine_volume, drive_type, transmission, publication_date FROM {table} ORDER BY rowid"
        ))
        .unwrap();
    stmt.query_map([], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
    })
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap()
}

#[test]
fn loading_twice_gives_the_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TableSink::new(dir.path().join("listings.sqlite"));
    let rows: Vec<_> = (0..3).map(listing).collect();

    assert!(sink.replace("youla", &rows));
    let first = dump(sink.path(), "youla");
    assert!(sink.replace("youla", &rows));
    let second = dump(sink.path(), "youla");

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(sink.row_count("youla").unwrap(), 3);
    assert_eq!(
        first[0],
        (
            "kia".to_string(),
            800_000,
            Some(1.6),
            Some("передний".to_string()),
            "механическая".to_string(),
            Some("2025-03-12".to_string())
        )
    );
}

#[test]
fn smaller_load_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TableSink::new(dir.path().join("listings.sqlite"));

    assert!(sink.replace("drom", &(0..5).map(listing).collect::<Vec<_>>()));
    assert!(sink.replace("drom", &[listing(42)]));

    assert_eq!(sink.row_count("drom").unwrap(), 1);
    assert_eq!(dump(sink.path(), "drom")[0].1, 800_042);
}

#[test]
fn column_types_follow_the_data() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TableSink::new(dir.path().join("listings.sqlite"));
    assert!(sink.replace("autoru", &[listing(1)]));

    let conn = Connection::open(sink.path()).unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(autoru)").unwrap();
    let columns: Vec<(String, String)> = stmt
        .query_map([], |r| Ok((r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let kind = |name: &str| {
        columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
            .unwrap()
    };
    assert_eq!(columns.len(), 14);
    assert_eq!(kind("year"), "INTEGER");
    assert_eq!(kind("engine_volume"), "REAL");
    assert_eq!(kind("location"), "TEXT");
    assert_eq!(kind("link"), "TEXT");
}

#[test]
fn empty_set_still_replaces_table() {
    let dir = tempfile::tempdir().unwrap();
    let sink = TableSink::new(dir.path().join("listings.sqlite"));

    assert!(sink.replace("avito", &[listing(1), listing(2)]));
    assert!(sink.replace("avito", &[]));
    assert_eq!(sink.row_count("avito").unwrap(), 0);
}
