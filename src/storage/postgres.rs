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

// PostgreSQL backend implementation

use super::backend::{bounded, StorageBackend};
use super::sql::{is_already_exists, map_sqlx_error, DbFailure, RecordRow, SqlStatements};
use crate::config::PostgresConfig;
use crate::error::{Error, Result};
use crate::record::Record;
use async_trait::async_trait;
use sqlx::error::DatabaseError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Executor;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// PostgreSQL backend: one row per record in `<schema>.<table>`
pub struct PostgresBackend {
    pool: PgPool,
    statements: SqlStatements,
    schema: OnceCell<()>,
    timeout: Duration,
}

impl PostgresBackend {
    /// Build a lazily connecting pool; no connection is made until first use
    pub fn new(config: PostgresConfig, timeout: Duration) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .database(&config.database)
            .application_name("sensor-gateway");
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(timeout)
            .connect_lazy_with(options);

        info!(
            "Initializing PostgreSQL backend at {}:{}/{} ({}.{})",
            config.host, config.port, config.database, config.schema, config.table
        );

        Self {
            pool,
            statements: statements(&config.schema, &config.table),
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
                // Concurrent IF NOT EXISTS can still collide in the catalog
                Err(e) if is_already_exists(&e, classify) => {
                    debug!("PostgreSQL object already exists: {}", e);
                }
                Err(e) => {
                    return Err(map_sqlx_error("PostgreSQL", "schema setup", e, classify, Error::Schema))
                }
            }
        }
        info!("PostgreSQL schema and table ready");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for PostgresBackend {
    async fn ensure_schema(&self) -> Result<()> {
        bounded(self.timeout, "PostgreSQL ensure_schema", self.schema_ready()).await
    }

    async fn store(&self, record: &Record) -> Result<()> {
        bounded(self.timeout, "PostgreSQL store", async {
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
                .map_err(|e| map_sqlx_error("PostgreSQL", "insert", e, classify, Error::Storage))?;
            debug!("Inserted record into PostgreSQL");
            Ok(())
        })
        .await
    }

    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let rows: Vec<RecordRow> = bounded(self.timeout, "PostgreSQL fetch_all", async {
            self.schema_ready().await?;
            sqlx::query_as::<_, RecordRow>(&self.statements.select)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("PostgreSQL", "select", e, classify, Error::Storage))
        })
        .await?;

        rows.into_iter()
            .map(|(recorded, location, sensor, measurement, units, value)| {
                Record::new(recorded, location, sensor, measurement, units, value)
                    .map_err(|e| Error::Storage(format!("Invalid record in PostgreSQL: {}", e)))
            })
            .collect()
    }

    async fn purge_all(&self) -> Result<()> {
        bounded(self.timeout, "PostgreSQL purge_all", async {
            self.schema_ready().await?;
            self.pool
                .execute(self.statements.purge.as_str())
                .await
                .map_err(|e| map_sqlx_error("PostgreSQL", "truncate", e, classify, Error::Storage))?;
            info!("PostgreSQL sensor data purged");
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let ping = async {
            self.pool
                .execute("SELECT 1")
                .await
                .map_err(|e| map_sqlx_error("PostgreSQL", "ping", e, classify, Error::Storage))
        };
        match bounded(self.timeout, "PostgreSQL health check", ping).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "postgres"
    }
}

fn statements(schema: &str, table: &str) -> SqlStatements {
    let target = format!("{}.{}", schema, table);
    SqlStatements {
        create_namespace: format!("CREATE SCHEMA IF NOT EXISTS {}", schema),
        create_table: format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id BIGSERIAL PRIMARY KEY, \
             recorded BIGINT NOT NULL, \
             location VARCHAR(255) NOT NULL, \
             sensor VARCHAR(255) NOT NULL, \
             measurement VARCHAR(255) NOT NULL, \
             units VARCHAR(50) NOT NULL, \
             value NUMERIC(12, 1) NOT NULL)",
            target
        ),
        insert: format!(
            "INSERT INTO {} (recorded, location, sensor, measurement, units, value) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            target
        ),
        select: format!(
            "SELECT recorded, location, sensor, measurement, units, value FROM {} ORDER BY id",
            target
        ),
        purge: format!("TRUNCATE TABLE {}", target),
    }
}

/// SQLSTATE based classification
fn classify(err: &dyn DatabaseError) -> DbFailure {
    match err.code().as_deref() {
        // duplicate_schema, duplicate_table, catalog unique_violation
        Some("42P06") | Some("42P07") | Some("23505") => DbFailure::AlreadyExists,
        // data_exception, integrity_constraint_violation
        Some(code) if code.starts_with("22") || code.starts_with("23") => DbFailure::BadData,
        _ => DbFailure::Other,
    }
}
