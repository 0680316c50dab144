// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// CSV rendering for record reports

use crate::record::{Record, FIELD_NAMES};
use std::borrow::Cow;

/// Render records as CSV.
///
/// Header row first, one row per record, rows separated by `\n` with no
/// trailing newline. An empty slice renders as an empty string, never as a
/// header-only document.
pub fn render_csv(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(FIELD_NAMES.join(","));

    for record in records {
        let row: Vec<String> = record
            .field_values()
            .iter()
            .map(|field| escape_field(field).into_owned())
            .collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Quote a field when it contains a delimiter, quote or line break
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_reference_report() {
        let csv = render_csv(&[Record::reference()]);
        assert_eq!(
            csv,
            "recorded,location,sensor,measurement,units,value\n1768570200,den,bmp280,temperature,C,22.3"
        );
    }

    #[test]
    fn test_empty_report_is_empty_string() {
        assert_eq!(render_csv(&[]), "");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("den"), "den");
        assert_eq!(escape_field("den, east"), "\"den, east\"");
        assert_eq!(escape_field("the \"den\""), "\"the \"\"den\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_rows_follow_insertion_order() {
        let first = Record::new(1, "den", "bmp280", "temperature", "C", Decimal::new(201, 1)).unwrap();
        let second =
            Record::new(2, "porch", "dht22", "humidity", "%", Decimal::new(455, 1)).unwrap();
        let csv = render_csv(&[first, second]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,den,bmp280,temperature,C,20.1");
        assert_eq!(lines[2], "2,porch,dht22,humidity,%,45.5");
        assert!(!csv.ends_with('\n'));
    }
}
