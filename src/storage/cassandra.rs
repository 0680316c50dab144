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

// Cassandra backend implementation
//
// Rows are keyed by a random uuid so identical readings are kept as
// separate rows. Cassandra has no decimal column of the right shape, so the
// value is stored as a double and re-normalized when read back.

use super::backend::{bounded, StorageBackend};
use crate::config::CassandraConfig;
use crate::error::{Error, Result};
use crate::record::{decimal_from_f64, decimal_to_f64, Record};
use async_trait::async_trait;
use scylla::transport::errors::{DbError, QueryError};
use scylla::{Session, SessionBuilder};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

type CassandraRow = (i64, String, String, String, String, f64);

/// Cassandra backend: one row per record in `<keyspace>.<table>`
pub struct CassandraBackend {
    session: OnceCell<Session>,
    node: String,
    keyspace: String,
    table: String,
    replication_factor: u32,
    schema: OnceCell<()>,
    timeout: Duration,
}

impl CassandraBackend {
    pub fn new(config: CassandraConfig, timeout: Duration) -> Self {
        let node = format!("{}:{}", config.host, config.port);
        info!(
            "Initializing Cassandra backend at {} ({}.{})",
            node, config.keyspace, config.table
        );

        Self {
            session: OnceCell::new(),
            node,
            keyspace: config.keyspace,
            table: config.table,
            replication_factor: config.replication_factor,
            schema: OnceCell::new(),
            timeout,
        }
    }

    fn target(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }

    async fn session(&self) -> Result<&Session> {
        self.session
            .get_or_try_init(|| async {
                debug!("Opening Cassandra session to {}", self.node);
                SessionBuilder::new()
                    .known_node(&self.node)
                    .connection_timeout(self.timeout)
                    .build()
                    .await
                    .map_err(|e| {
                        Error::Connection(format!(
                            "Cassandra session to {} failed: {}",
                            self.node, e
                        ))
                    })
            })
            .await
    }

    async fn schema_ready(&self) -> Result<()> {
        self.schema.get_or_try_init(|| self.create_schema()).await?;
        Ok(())
    }

    async fn create_schema(&self) -> Result<()> {
        let session = self.session().await?;
        let keyspace = format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
             {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
            self.keyspace, self.replication_factor
        );
        let table = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id uuid PRIMARY KEY, \
             recorded bigint, \
             location text, \
             sensor text, \
             measurement text, \
             units text, \
             value double)",
            self.target()
        );

        for statement in [keyspace, table] {
            match session.query(statement, ()).await {
                Ok(_) => {}
                Err(QueryError::DbError(DbError::AlreadyExists { .. }, msg)) => {
                    debug!("Cassandra object already exists: {}", msg);
                }
                Err(e) => return Err(map_query_error("schema setup", e, Error::Schema)),
            }
        }
        info!("Cassandra keyspace and table ready");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for CassandraBackend {
    async fn ensure_schema(&self) -> Result<()> {
        bounded(self.timeout, "Cassandra ensure_schema", self.schema_ready()).await
    }

    async fn store(&self, record: &Record) -> Result<()> {
        let value = decimal_to_f64(record.value())?;
        let insert = format!(
            "INSERT INTO {} (id, recorded, location, sensor, measurement, units, value) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.target()
        );

        bounded(self.timeout, "Cassandra store", async {
            self.schema_ready().await?;
            let session = self.session().await?;
            session
                .query(
                    insert,
                    (
                        Uuid::new_v4(),
                        record.recorded(),
                        record.location(),
                        record.sensor(),
                        record.measurement(),
                        record.units(),
                        value,
                    ),
                )
                .await
                .map_err(|e| map_query_error("insert", e, Error::Storage))?;
            debug!("Inserted record into Cassandra");
            Ok(())
        })
        .await
    }

    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let select = format!(
            "SELECT recorded, location, sensor, measurement, units, value FROM {}",
            self.target()
        );

        let rows: Vec<CassandraRow> = bounded(self.timeout, "Cassandra fetch_all", async {
            self.schema_ready().await?;
            let session = self.session().await?;
            let result = session
                .query(select, ())
                .await
                .map_err(|e| map_query_error("select", e, Error::Storage))?;
            result
                .rows_typed_or_empty::<CassandraRow>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::Storage(format!("Corrupt row in Cassandra: {}", e)))
        })
        .await?;

        rows.into_iter()
            .map(|(recorded, location, sensor, measurement, units, value)| {
                Record::new(
                    recorded,
                    location,
                    sensor,
                    measurement,
                    units,
                    decimal_from_f64(value)?,
                )
                .map_err(|e| Error::Storage(format!("Invalid record in Cassandra: {}", e)))
            })
            .collect()
    }

    async fn purge_all(&self) -> Result<()> {
        let truncate = format!("TRUNCATE {}", self.target());
        bounded(self.timeout, "Cassandra purge_all", async {
            self.schema_ready().await?;
            let session = self.session().await?;
            session
                .query(truncate, ())
                .await
                .map_err(|e| map_query_error("truncate", e, Error::Storage))?;
            info!("Cassandra sensor data purged");
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let ping = async {
            let session = self.session().await?;
            session
                .query("SELECT release_version FROM system.local", ())
                .await
                .map_err(|e| map_query_error("ping", e, Error::Storage))
        };
        match bounded(self.timeout, "Cassandra health check", ping).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "cassandra"
    }
}

fn map_query_error(operation: &str, err: QueryError, fallback: fn(String) -> Error) -> Error {
    let message = format!("Cassandra {} failed: {}", operation, err);
    match &err {
        QueryError::IoError(_)
        | QueryError::TimeoutError
        | QueryError::RequestTimeout(_)
        | QueryError::DbError(DbError::Unavailable { .. }, _)
        | QueryError::DbError(DbError::Overloaded, _) => Error::Connection(message),
        QueryError::DbError(DbError::Invalid, _) if operation == "insert" => {
            Error::Write(message)
        }
        _ => fallback(message),
    }
}
