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

// Ingestion service: the engine-agnostic operations behind the HTTP surface

use crate::error::{Error, Result};
use crate::record::Record;
use crate::report::render_csv;
use crate::storage::StorageBackend;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Validates inbound payloads and forwards them to the selected backend
pub struct IngestionService {
    backend: Arc<dyn StorageBackend>,
}

impl IngestionService {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Name of the backend in use
    pub fn backend_type(&self) -> &str {
        self.backend.backend_type()
    }

    /// Return the payload unchanged if it is a JSON object
    pub fn echo(&self, payload: &[u8]) -> Result<Value> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| Error::Validation(format!("Invalid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(Error::Validation("Payload must be a JSON object".to_string()));
        }
        Ok(value)
    }

    /// Validate a payload and store it as a record
    pub async fn log(&self, payload: &[u8]) -> Result<Record> {
        let record = Record::from_json(payload)?;
        self.backend.store(&record).await?;
        debug!(
            "Logged {} reading from {}/{}",
            record.measurement(),
            record.location(),
            record.sensor()
        );
        Ok(record)
    }

    /// Every stored record as CSV
    pub async fn report(&self) -> Result<String> {
        let records = self.backend.fetch_all().await?;
        debug!("Rendering report for {} records", records.len());
        Ok(render_csv(&records))
    }

    pub async fn records(&self) -> Result<Vec<Record>> {
        self.backend.fetch_all().await
    }

    pub async fn purge(&self) -> Result<()> {
        self.backend.purge_all().await?;
        info!("Purged all records from {}", self.backend.backend_type());
        Ok(())
    }

    /// Backend name and reachability
    pub async fn health(&self) -> (String, bool) {
        let healthy = self.backend.health_check().await.unwrap_or(false);
        (self.backend.backend_type().to_string(), healthy)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        self.backend.ensure_schema().await
    }

    /// Store the reference reading and a random one from `location`, render
    /// the report, then purge. Returns the rendered CSV.
    pub async fn demo(&self, location: &str) -> Result<String> {
        self.ensure_schema().await?;

        for record in [Record::reference(), Record::random_reading(location)?] {
            self.log(record.to_json()?.as_bytes()).await?;
            info!(
                "Stored {} {} from {} in {}",
                record.value(),
                record.units(),
                record.location(),
                self.backend_type()
            );
        }

        let report = self.report().await?;
        self.purge().await?;
        Ok(report)
    }
}
