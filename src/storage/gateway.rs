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

// Storage gateway: resolves a backend name to a storage backend

use super::backend::StorageBackend;
use super::cassandra::CassandraBackend;
use super::memory::MemoryBackend;
use super::mongo::MongoBackend;
use super::mysql::MySqlBackend;
use super::postgres::PostgresBackend;
use super::redis::RedisBackend;
use crate::config::StorageConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// The closed set of supported storage engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Document store
    Mongo,
    MySql,
    Postgres,
    /// Wide-column store
    Cassandra,
    /// Key-value store
    Redis,
    /// In-process store for tests and local runs
    Memory,
}

impl BackendKind {
    pub const ALL: [BackendKind; 6] = [
        BackendKind::Mongo,
        BackendKind::MySql,
        BackendKind::Postgres,
        BackendKind::Cassandra,
        BackendKind::Redis,
        BackendKind::Memory,
    ];

    /// Backend used when no name is configured
    pub const DEFAULT: BackendKind = BackendKind::Mongo;

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mongo => "mongo",
            BackendKind::MySql => "mysql",
            BackendKind::Postgres => "postgres",
            BackendKind::Cassandra => "cassandra",
            BackendKind::Redis => "redis",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "Unknown storage backend: '{}'. Supported: mongo, mysql, postgres, cassandra, redis, memory",
                    name
                ))
            })
    }
}

pub struct StorageGateway;

impl StorageGateway {
    /// Resolve a backend name, defaulting only when no name was supplied
    pub fn resolve(name: Option<&str>) -> Result<BackendKind> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.parse(),
            None => Ok(BackendKind::DEFAULT),
        }
    }

    /// Create the storage backend selected by `name`
    ///
    /// Backends connect lazily, so this never touches the network. It must be
    /// called from within a tokio runtime because some drivers spawn their
    /// pool maintenance tasks on construction.
    pub fn select(name: Option<&str>, config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
        let kind = Self::resolve(name)?;
        let backend = Self::create(kind, config)?;
        info!("Storage backend selected: {}", kind);
        Ok(backend)
    }

    /// Create the storage backend named in the configuration
    pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
        Self::select(config.backend.as_deref(), config)
    }

    /// Create a storage backend of a given kind
    pub fn create(kind: BackendKind, config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
        let timeout = config.timeout();
        let backend: Arc<dyn StorageBackend> = match kind {
            BackendKind::Mongo => Arc::new(MongoBackend::new(config.mongo.clone(), timeout)?),
            BackendKind::MySql => Arc::new(MySqlBackend::new(config.mysql.clone(), timeout)),
            BackendKind::Postgres => {
                Arc::new(PostgresBackend::new(config.postgres.clone(), timeout))
            }
            BackendKind::Cassandra => {
                Arc::new(CassandraBackend::new(config.cassandra.clone(), timeout))
            }
            BackendKind::Redis => Arc::new(RedisBackend::new(config.redis.clone(), timeout)?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_when_absent() {
        assert_eq!(StorageGateway::resolve(None).unwrap(), BackendKind::Mongo);
        assert_eq!(StorageGateway::resolve(Some("  ")).unwrap(), BackendKind::Mongo);
    }

    #[test]
    fn test_resolve_known_names() {
        for kind in BackendKind::ALL {
            assert_eq!(StorageGateway::resolve(Some(kind.as_str())).unwrap(), kind);
        }
        assert_eq!(
            StorageGateway::resolve(Some("Redis")).unwrap(),
            BackendKind::Redis
        );
    }

    #[test]
    fn test_resolve_unknown_backend() {
        let result = StorageGateway::resolve(Some("couchdb"));
        match result {
            Err(Error::Configuration(msg)) => assert!(msg.contains("Unknown storage backend")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_every_backend() {
        let config = StorageConfig::default();
        for kind in BackendKind::ALL {
            let backend = StorageGateway::create(kind, &config).unwrap();
            assert_eq!(backend.backend_type(), kind.as_str());
        }
    }

    #[tokio::test]
    async fn test_select_unknown_backend() {
        let result = StorageGateway::select(Some("unknown_backend"), &StorageConfig::default());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
