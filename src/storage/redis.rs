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

// Redis backend implementation
//
// Records are JSON documents in a single Redis list. RPUSH keeps the list in
// insertion order, so LRANGE 0 -1 returns records oldest first.

use super::backend::{bounded, StorageBackend};
use crate::config::RedisConfig;
use crate::error::{Error, Result};
use crate::record::Record;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Redis list backend
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    list_key: String,
    timeout: Duration,
}

impl RedisBackend {
    pub fn new(config: RedisConfig, timeout: Duration) -> Result<Self> {
        let url = format!("redis://{}:{}/", config.host, config.port);
        let client = Client::open(url.as_str()).map_err(|e| {
            Error::Configuration(format!("Invalid Redis address {}: {}", url, e))
        })?;

        info!(
            "Initializing Redis backend at {} (list '{}')",
            url, config.list_key
        );

        Ok(Self {
            client,
            connection: OnceCell::new(),
            list_key: config.list_key,
            timeout,
        })
    }

    /// Shared multiplexed connection, opened on first use
    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!("Opening Redis connection");
                ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| map_redis_error("connect", e, Error::Connection))
            })
            .await?;
        Ok(manager.clone())
    }

    async fn ping(&self) -> Result<()> {
        let mut con = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut con)
            .await
            .map_err(|e| map_redis_error("PING", e, Error::Storage))?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    async fn ensure_schema(&self) -> Result<()> {
        // Lists are created by the first RPUSH; only reachability is checked
        bounded(self.timeout, "Redis ensure_schema", self.ping()).await
    }

    async fn store(&self, record: &Record) -> Result<()> {
        let payload = record.to_json()?;
        bounded(self.timeout, "Redis store", async {
            let mut con = self.connection().await?;
            con.rpush::<_, _, ()>(&self.list_key, &payload)
                .await
                .map_err(|e| map_redis_error("RPUSH", e, Error::Storage))?;
            debug!("Pushed record to Redis list '{}'", self.list_key);
            Ok(())
        })
        .await
    }

    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let values: Vec<String> = bounded(self.timeout, "Redis fetch_all", async {
            let mut con = self.connection().await?;
            con.lrange(&self.list_key, 0, -1)
                .await
                .map_err(|e| map_redis_error("LRANGE", e, Error::Storage))
        })
        .await?;

        values
            .iter()
            .map(|value| {
                serde_json::from_str::<Record>(value).map_err(|e| {
                    Error::Storage(format!(
                        "Corrupt record in Redis list '{}': {}",
                        self.list_key, e
                    ))
                })
            })
            .collect()
    }

    async fn purge_all(&self) -> Result<()> {
        bounded(self.timeout, "Redis purge_all", async {
            let mut con = self.connection().await?;
            con.del::<_, ()>(&self.list_key)
                .await
                .map_err(|e| map_redis_error("DEL", e, Error::Storage))?;
            info!("Redis list '{}' purged", self.list_key);
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        match bounded(self.timeout, "Redis health check", self.ping()).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "redis"
    }
}

fn map_redis_error(operation: &str, err: RedisError, fallback: fn(String) -> Error) -> Error {
    let message = format!("Redis {} failed: {}", operation, err);
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        Error::Connection(message)
    } else {
        fallback(message)
    }
}
