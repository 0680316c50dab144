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

// Storage backend trait for sensor records

use crate::error::{Error, Result};
use crate::record::Record;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Generic storage backend trait for sensor records
///
/// Every backend exposes the same four operations with identical observable
/// behavior, so the service can switch engines without code changes.
/// Implementations bound every network call with their configured timeout
/// and release connections on every exit path.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Create the namespace/table/keyspace if missing.
    ///
    /// Idempotent and safe to call concurrently. "Already exists" answers
    /// from the engine count as success.
    async fn ensure_schema(&self) -> Result<()>;

    /// Append one record
    async fn store(&self, record: &Record) -> Result<()>;

    /// Every stored record. An empty dataset is `Ok(vec![])`.
    async fn fetch_all(&self) -> Result<Vec<Record>>;

    /// Delete every stored record. Purging an empty dataset succeeds.
    async fn purge_all(&self) -> Result<()>;

    /// Health check
    async fn health_check(&self) -> Result<bool>;

    /// Get backend type identifier
    fn backend_type(&self) -> &str;
}

/// Run a backend call, failing with [`Error::Connection`] once `timeout` elapses
pub(crate) async fn bounded<T, F>(timeout: Duration, operation: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Connection(format!(
            "{} timed out after {:?}",
            operation, timeout
        ))),
    }
}
