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

// Sensor record value object and its JSON wire mapping

use crate::error::{Error, Result};
use chrono::Utc;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Record field names in wire and CSV column order
pub const FIELD_NAMES: [&str; 6] = [
    "recorded",
    "location",
    "sensor",
    "measurement",
    "units",
    "value",
];

/// Decimal places kept for `value` by every backend
pub const VALUE_SCALE: u32 = 1;

/// Exclusive bound on `|value|`. Fits `DECIMAL(12, 1)` and is exact as a double.
pub const VALUE_LIMIT: i64 = 100_000_000_000;

/// A single sensor reading.
///
/// Records are immutable: fields are only reachable through accessors, and
/// every constructor validates and normalizes the reading. `value` is rounded
/// to one decimal place so that all backends hand back the same decimal.
///
/// Deserialization goes through [`Record::try_from`], which accepts the
/// lenient wire forms sent by field collectors (`recorded` and `value` as
/// numeric strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Record {
    recorded: i64,
    location: String,
    sensor: String,
    measurement: String,
    units: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    value: Decimal,
}

impl Record {
    pub fn new(
        recorded: i64,
        location: impl Into<String>,
        sensor: impl Into<String>,
        measurement: impl Into<String>,
        units: impl Into<String>,
        value: Decimal,
    ) -> Result<Self> {
        if recorded < 0 {
            return Err(Error::Validation(format!(
                "Field 'recorded' must be a non-negative unix timestamp, got {}",
                recorded
            )));
        }

        let location = location.into();
        let sensor = sensor.into();
        require_non_empty("location", &location)?;
        require_non_empty("sensor", &sensor)?;

        let value = normalize_value(value);
        if value.abs() >= Decimal::from(VALUE_LIMIT) {
            return Err(Error::Validation(format!(
                "Field 'value' must be between -{limit} and {limit} exclusive, got {}",
                value,
                limit = VALUE_LIMIT
            )));
        }

        Ok(Self {
            recorded,
            location,
            sensor,
            measurement: measurement.into(),
            units: units.into(),
            value,
        })
    }

    /// Parse and validate a JSON payload
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| Error::Validation(format!("Invalid JSON: {}", e)))?;
        Self::try_from(value)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::Storage(format!("Failed to serialize record: {}", e)))
    }

    /// The reading used by the demo workflow and the reference scenario
    pub fn reference() -> Self {
        Self {
            recorded: 1768570200,
            location: "den".to_string(),
            sensor: "bmp280".to_string(),
            measurement: "temperature".to_string(),
            units: "C".to_string(),
            value: Decimal::new(223, 1),
        }
    }

    /// Current-time bmp280 temperature reading with a random value in [22.4, 32.1)
    pub fn random_reading(location: &str) -> Result<Self> {
        let tenths: i64 = rand::thread_rng().gen_range(224..321);
        Self::new(
            Utc::now().timestamp(),
            location,
            "bmp280",
            "temperature",
            "C",
            Decimal::new(tenths, VALUE_SCALE),
        )
    }

    pub fn recorded(&self) -> i64 {
        self.recorded
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Field values rendered as text, in [`FIELD_NAMES`] order
    pub fn field_values(&self) -> [String; 6] {
        [
            self.recorded.to_string(),
            self.location.clone(),
            self.sensor.clone(),
            self.measurement.clone(),
            self.units.clone(),
            self.value.to_string(),
        ]
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(payload: Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| Error::Validation("Sensor reading must be a JSON object".to_string()))?;

        let recorded = parse_recorded(required(object, "recorded")?)?;
        let value = parse_value(required(object, "value")?)?;

        Self::new(
            recorded,
            text_field(object, "location")?,
            text_field(object, "sensor")?,
            text_field(object, "measurement")?,
            text_field(object, "units")?,
            value,
        )
    }
}

/// Convert a stored double back into a record value
pub(crate) fn decimal_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::Storage(format!("Stored value is not finite: {}", value)));
    }
    parse_decimal(&value.to_string())
        .ok_or_else(|| Error::Storage(format!("Stored value out of range: {}", value)))
}

/// Convert a record value into a double for engines without a decimal column
pub(crate) fn decimal_to_f64(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| Error::Write(format!("Value {} cannot be stored as a double", value)))
}

fn normalize_value(value: Decimal) -> Decimal {
    let mut value =
        value.round_dp_with_strategy(VALUE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(VALUE_SCALE);
    value
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("Field '{}' must not be empty", name)));
    }
    Ok(())
}

fn required<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    object
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| Error::Validation(format!("Missing field: {}", name)))
}

fn text_field(object: &Map<String, Value>, name: &str) -> Result<String> {
    required(object, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Validation(format!("Field '{}' must be a string", name)))
}

fn parse_recorded(value: &Value) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::Validation(format!(
            "Field 'recorded' must be an integer unix timestamp, got {}",
            value
        ))
    })
}

fn parse_value(value: &Value) -> Result<Decimal> {
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::Validation(format!("Field 'value' must be a decimal number, got {}", value))
    })
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
