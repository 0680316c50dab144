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

// MongoDB backend implementation

use super::backend::{bounded, StorageBackend};
use crate::config::MongoConfig;
use crate::error::{Error, Result};
use crate::record::{decimal_from_f64, decimal_to_f64, Record};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::{Client, Collection};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Server error code returned when a collection already exists
const NAMESPACE_EXISTS: i32 = 48;

/// MongoDB backend storing one document per record
pub struct MongoBackend {
    client: Client,
    database: String,
    collection: String,
    schema: OnceCell<()>,
    timeout: Duration,
}

impl MongoBackend {
    pub fn new(config: MongoConfig, timeout: Duration) -> Result<Self> {
        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: config.host.clone(),
                port: Some(config.port),
            }])
            .app_name("sensor-gateway".to_string())
            .connect_timeout(timeout)
            .server_selection_timeout(timeout)
            .build();

        let client = Client::with_options(options).map_err(|e| {
            Error::Configuration(format!("Invalid MongoDB client options: {}", e))
        })?;

        info!(
            "Initializing MongoDB backend at {}:{} ({}.{})",
            config.host, config.port, config.database, config.collection
        );

        Ok(Self {
            client,
            database: config.database,
            collection: config.collection,
            schema: OnceCell::new(),
            timeout,
        })
    }

    fn collection(&self) -> Collection<Document> {
        self.client
            .database(&self.database)
            .collection::<Document>(&self.collection)
    }

    async fn schema_ready(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| self.create_collection())
            .await?;
        Ok(())
    }

    async fn create_collection(&self) -> Result<()> {
        let database = self.client.database(&self.database);
        let existing = database
            .list_collection_names(None)
            .await
            .map_err(|e| map_mongo_error("list collections", e, Error::Schema))?;

        if existing.iter().any(|name| name == &self.collection) {
            debug!("Collection '{}' already exists", self.collection);
            return Ok(());
        }

        match database.create_collection(&self.collection, None).await {
            Ok(()) => {
                info!("Created collection '{}.{}'", self.database, self.collection);
                Ok(())
            }
            // Another caller created it between the listing and the create
            Err(e) if is_namespace_exists(&e) => Ok(()),
            Err(e) => Err(map_mongo_error("create collection", e, Error::Schema)),
        }
    }
}

#[async_trait]
impl StorageBackend for MongoBackend {
    async fn ensure_schema(&self) -> Result<()> {
        bounded(self.timeout, "MongoDB ensure_schema", self.schema_ready()).await
    }

    async fn store(&self, record: &Record) -> Result<()> {
        let document = doc! {
            "recorded": record.recorded(),
            "location": record.location(),
            "sensor": record.sensor(),
            "measurement": record.measurement(),
            "units": record.units(),
            "value": decimal_to_f64(record.value())?,
        };

        bounded(self.timeout, "MongoDB store", async {
            self.schema_ready().await?;
            self.collection()
                .insert_one(document, None)
                .await
                .map_err(|e| {
                    if is_rejected_write(&e) {
                        Error::Write(format!("MongoDB insert rejected: {}", e))
                    } else {
                        map_mongo_error("insert", e, Error::Storage)
                    }
                })?;
            debug!("Inserted record into '{}'", self.collection);
            Ok(())
        })
        .await
    }

    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let documents: Vec<Document> = bounded(self.timeout, "MongoDB fetch_all", async {
            self.schema_ready().await?;
            let cursor = self
                .collection()
                .find(None, None)
                .await
                .map_err(|e| map_mongo_error("find", e, Error::Storage))?;
            cursor
                .try_collect()
                .await
                .map_err(|e| map_mongo_error("cursor", e, Error::Storage))
        })
        .await?;

        documents.iter().map(document_to_record).collect()
    }

    async fn purge_all(&self) -> Result<()> {
        bounded(self.timeout, "MongoDB purge_all", async {
            self.schema_ready().await?;
            let result = self
                .collection()
                .delete_many(doc! {}, None)
                .await
                .map_err(|e| map_mongo_error("delete", e, Error::Storage))?;
            info!("MongoDB purged {} documents", result.deleted_count);
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let ping = async {
            self.client
                .database("admin")
                .run_command(doc! { "ping": 1 }, None)
                .await
                .map_err(|e| map_mongo_error("ping", e, Error::Storage))
        };
        match bounded(self.timeout, "MongoDB health check", ping).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "mongo"
    }
}

fn document_to_record(document: &Document) -> Result<Record> {
    let corrupt = |field: &str| {
        Error::Storage(format!("MongoDB document has invalid field '{}'", field))
    };
    let text = |field: &str| document.get_str(field).map_err(|_| corrupt(field));

    let recorded = match document.get("recorded") {
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Int32(v)) => i64::from(*v),
        _ => return Err(corrupt("recorded")),
    };
    let value = match document.get("value") {
        Some(Bson::Double(v)) => decimal_from_f64(*v)?,
        Some(Bson::Int64(v)) => (*v).into(),
        Some(Bson::Int32(v)) => (*v).into(),
        _ => return Err(corrupt("value")),
    };

    Record::new(
        recorded,
        text("location")?,
        text("sensor")?,
        text("measurement")?,
        text("units")?,
        value,
    )
    .map_err(|e| Error::Storage(format!("Invalid record in MongoDB: {}", e)))
}

fn is_namespace_exists(err: &MongoError) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(cmd) if cmd.code == NAMESPACE_EXISTS)
}

fn is_rejected_write(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(_))
            | ErrorKind::InvalidArgument { .. }
            | ErrorKind::BsonSerialization(_)
    )
}

fn map_mongo_error(operation: &str, err: MongoError, fallback: fn(String) -> Error) -> Error {
    let message = format!("MongoDB {} failed: {}", operation, err);
    match err.kind.as_ref() {
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => Error::Connection(message),
        _ => fallback(message),
    }
}
