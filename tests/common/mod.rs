// Shared checks run against every storage backend

#![allow(dead_code)]

use rust_decimal::Decimal;
use sensor_gateway::{render_csv, Record, StorageBackend};
use std::sync::Arc;

pub const REFERENCE_CSV: &str = "recorded,location,sensor,measurement,units,value\n\
                                 1768570200,den,bmp280,temperature,C,22.3";

pub const REFERENCE_PAYLOAD: &str = r#"{"recorded": 1768570200, "location": "den", "sensor": "bmp280", "measurement": "temperature", "units": "C", "value": 22.3}"#;

/// Records ordered by their CSV fields, for engines without insertion order
pub fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|r| r.field_values());
    records
}

/// Observable behavior every backend must share
pub async fn check_backend_contract(backend: Arc<dyn StorageBackend>) {
    // Schema setup is idempotent and safe to race
    backend.ensure_schema().await.expect("ensure_schema failed");
    backend.ensure_schema().await.expect("second ensure_schema failed");
    let (a, b) = tokio::join!(backend.ensure_schema(), backend.ensure_schema());
    a.expect("concurrent ensure_schema failed");
    b.expect("concurrent ensure_schema failed");

    backend.purge_all().await.expect("purge failed");
    assert!(backend.fetch_all().await.unwrap().is_empty());

    // Reference scenario
    backend.store(&Record::reference()).await.expect("store failed");
    let records = backend.fetch_all().await.unwrap();
    assert_eq!(records, vec![Record::reference()]);
    assert_eq!(render_csv(&records), REFERENCE_CSV);

    // Duplicates are kept as separate records
    let reading = Record::random_reading("kitchen").unwrap();
    backend.store(&reading).await.unwrap();
    backend.store(&reading).await.unwrap();
    let records = backend.fetch_all().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        sorted(records),
        sorted(vec![Record::reference(), reading.clone(), reading])
    );

    // Whole numbers and the largest storable value come back unchanged
    backend.purge_all().await.expect("purge failed");
    let whole = Record::new(1, "den", "bmp280", "temperature", "C", Decimal::from(22)).unwrap();
    let largest = Record::new(
        2,
        "den",
        "bmp280",
        "pressure",
        "Pa",
        Decimal::new(999_999_999_999, 1),
    )
    .unwrap();
    backend.store(&whole).await.unwrap();
    backend.store(&largest).await.unwrap();
    let fetched: Vec<[String; 6]> = sorted(backend.fetch_all().await.unwrap())
        .iter()
        .map(Record::field_values)
        .collect();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0][5], "22.0");
    assert_eq!(fetched[1][5], "99999999999.9");

    // Purge leaves an empty dataset and can be repeated
    backend.purge_all().await.expect("purge failed");
    assert!(backend.fetch_all().await.unwrap().is_empty());
    backend.purge_all().await.expect("second purge failed");
    assert_eq!(render_csv(&backend.fetch_all().await.unwrap()), "");
}
