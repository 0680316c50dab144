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

// MySQL backend implementation
//
// Connects without a default database so that the database itself can be
// created on demand; every statement uses `<database>.<table>`.

use super::backend::{bounded, StorageBackend};
use super::sql::{is_already_exists, map_sqlx_error, DbFailure, RecordRow, SqlStatements};
use crate::config::MySqlConfig;
use crate::error::{Error, Result};
use crate::record::Record;
use async_trait::async_trait;
use sqlx::error::DatabaseError;
use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlPool, MySqlPoolOptions};
use sqlx::Executor;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// MySQL backend: one row per record in `<database>.<table>`
pub struct MySqlBackend {
    pool: MySqlPool,
    statements: SqlStatements,
    schema: OnceCell<()>,
    timeout: Duration,
}

impl MySqlBackend {
    /// Build a lazily connecting pool; no connection is made until first use
    pub fn new(config: MySqlConfig, timeout: Duration) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(timeout)
            .connect_lazy_with(options);

        info!(
            "Initializing MySQL backend at {}:{} ({}.{})",
            config.host, config.port, config.database, config.table
        );

        Self {
            pool,
            statements: statements(&config.database, &config.table),
            schema: OnceCell::new(),
            timeout,
        }
    }

    async fn schema_ready(&self) -> Result<()> {
        self.schema.get_or_try_init(|| self.create_schema()).await?;
        Ok(())
    }

    async fn create_schema(&self) -> Result<()> {
        for statement in [&self.statements.create_namespace, &self.statements.create_table] {
            match self.pool.execute(statement.as_str()).await {
                Ok(_) => {}
                Err(e) if is_already_exists(&e, classify) => {
                    debug!("MySQL object already exists: {}", e);
                }
                Err(e) => {
                    return Err(map_sqlx_error("MySQL", "schema setup", e, classify, Error::Schema))
                }
            }
        }
        info!("MySQL database and table ready");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MySqlBackend {
    async fn ensure_schema(&self) -> Result<()> {
        bounded(self.timeout, "MySQL ensure_schema", self.schema_ready()).await
    }

    async fn store(&self, record: &Record) -> Result<()> {
        bounded(self.timeout, "MySQL store", async {
            self.schema_ready().await?;
            sqlx::query(&self.statements.insert)
                .bind(record.recorded())
                .bind(record.location())
                .bind(record.sensor())
                .bind(record.measurement())
                .bind(record.units())
                .bind(record.value())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("MySQL", "insert", e, classify, Error::Storage))?;
            debug!("Inserted record into MySQL");
            Ok(())
        })
        .await
    }

    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let rows: Vec<RecordRow> = bounded(self.timeout, "MySQL fetch_all", async {
            self.schema_ready().await?;
            sqlx::query_as::<_, RecordRow>(&self.statements.select)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("MySQL", "select", e, classify, Error::Storage))
        })
        .await?;

        rows.into_iter()
            .map(|(recorded, location, sensor, measurement, units, value)| {
                Record::new(recorded, location, sensor, measurement, units, value)
                    .map_err(|e| Error::Storage(format!("Invalid record in MySQL: {}", e)))
            })
            .collect()
    }

    async fn purge_all(&self) -> Result<()> {
        bounded(self.timeout, "MySQL purge_all", async {
            self.schema_ready().await?;
            self.pool
                .execute(self.statements.purge.as_str())
                .await
                .map_err(|e| map_sqlx_error("MySQL", "truncate", e, classify, Error::Storage))?;
            info!("MySQL sensor data purged");
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let ping = async {
            self.pool
                .execute("SELECT 1")
                .await
                .map_err(|e| map_sqlx_error("MySQL", "ping", e, classify, Error::Storage))
        };
        match bounded(self.timeout, "MySQL health check", ping).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "mysql"
    }
}

fn statements(database: &str, table: &str) -> SqlStatements {
    let target = format!("{}.{}", database, table);
    SqlStatements {
        create_namespace: format!("CREATE DATABASE IF NOT EXISTS {}", database),
        create_table: format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id BIGINT AUTO_INCREMENT PRIMARY KEY, \
             recorded BIGINT NOT NULL, \
             location VARCHAR(255) NOT NULL, \
             sensor VARCHAR(255) NOT NULL, \
             measurement VARCHAR(255) NOT NULL, \
             units VARCHAR(50) NOT NULL, \
             value DECIMAL(12, 1) NOT NULL)",
            target
        ),
        insert: format!(
            "INSERT INTO {} (recorded, location, sensor, measurement, units, value) \
             VALUES (?, ?, ?, ?, ?, ?)",
            target
        ),
        select: format!(
            "SELECT recorded, location, sensor, measurement, units, value FROM {} ORDER BY id",
            target
        ),
        purge: format!("TRUNCATE TABLE {}", target),
    }
}

/// Server error number based classification
fn classify(err: &dyn DatabaseError) -> DbFailure {
    match err.try_downcast_ref::<MySqlDatabaseError>().map(|e| e.number()) {
        // ER_DB_CREATE_EXISTS, ER_TABLE_EXISTS_ERROR
        Some(1007) | Some(1050) => DbFailure::AlreadyExists,
        // ER_BAD_NULL_ERROR, ER_WARN_DATA_OUT_OF_RANGE, WARN_DATA_TRUNCATED,
        // ER_TRUNCATED_WRONG_VALUE_FOR_FIELD, ER_DATA_TOO_LONG
        Some(1048) | Some(1264) | Some(1265) | Some(1366) | Some(1406) => DbFailure::BadData,
        _ => DbFailure::Other,
    }
}
