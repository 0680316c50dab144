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

// In-process backend implementation

use super::backend::StorageBackend;
use crate::error::Result;
use crate::record::Record;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Keeps records in process memory, in insertion order.
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<Vec<Record>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn store(&self, record: &Record) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        debug!("Stored record in memory ({} total)", records.len());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Record>> {
        Ok(self.records.read().await.clone())
    }

    async fn purge_all(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_and_fetch() {
        let backend = MemoryBackend::new();
        backend.store(&Record::reference()).await.unwrap();
        backend.store(&Record::reference()).await.unwrap();

        let records = backend.fetch_all().await.unwrap();
        assert_eq!(records, vec![Record::reference(), Record::reference()]);
    }

    #[tokio::test]
    async fn test_fetch_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.purge_all().await.unwrap();
        backend.store(&Record::reference()).await.unwrap();
        backend.purge_all().await.unwrap();
        backend.purge_all().await.unwrap();
        assert!(backend.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preserves_insertion_order() {
        let backend = MemoryBackend::new();
        for i in 0..5 {
            let record =
                Record::new(i, "den", "bmp280", "temperature", "C", Decimal::new(200 + i, 1))
                    .unwrap();
            backend.store(&record).await.unwrap();
        }
        let recorded: Vec<i64> = backend
            .fetch_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.recorded())
            .collect();
        assert_eq!(recorded, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_concurrent_stores() {
        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.ensure_schema().await.unwrap();
                backend.store(&Record::reference()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(backend.fetch_all().await.unwrap().len(), 10);
    }
}
