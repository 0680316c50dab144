// CSV report tests

use rust_decimal::Decimal;
use sensor_gateway::record::FIELD_NAMES;
use sensor_gateway::{render_csv, Record};

// Minimal RFC 4180 reader for checking what the renderer produces
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => quoted = false,
            (true, c) => field.push(c),
            (false, '"') => quoted = true,
            (false, ',') => row.push(std::mem::take(&mut field)),
            (false, '\n') => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            (false, c) => field.push(c),
        }
    }
    row.push(field);
    rows.push(row);
    rows
}

#[test]
fn test_header_and_row_count() {
    let records = vec![
        Record::reference(),
        Record::random_reading("garage").unwrap(),
        Record::random_reading("attic").unwrap(),
    ];
    let csv = render_csv(&records);
    let rows = parse_csv(&csv);

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], FIELD_NAMES.to_vec());
    assert!(!csv.ends_with('\n'));
}

#[test]
fn test_special_characters_round_trip() {
    let record = Record::new(
        1768570200,
        "den, north wall",
        "bmp280 \"rev b\"",
        "temperature\nraw",
        "C",
        Decimal::new(-53, 1),
    )
    .unwrap();
    let csv = render_csv(std::slice::from_ref(&record));
    let rows = parse_csv(&csv);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], record.field_values().to_vec());
    assert_eq!(rows[1][5], "-5.3");
}

#[test]
fn test_empty_report() {
    assert_eq!(render_csv(&[]), "");
}

#[test]
fn test_whole_numbers_keep_one_decimal() {
    let record = Record::new(1, "den", "bmp280", "temperature", "C", Decimal::new(2200, 2)).unwrap();
    let csv = render_csv(&[record]);
    assert!(csv.ends_with(",C,22.0"), "unexpected report {:?}", csv);

    let record = Record::from_json(
        br#"{"recorded": 1, "location": "den", "sensor": "bmp280", "measurement": "temperature", "units": "C", "value": 22.0}"#,
    )
    .unwrap();
    let csv = render_csv(&[record]);
    assert!(csv.ends_with(",C,22.0"), "unexpected report {:?}", csv);
}
