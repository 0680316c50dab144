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

// Configuration types for sensor-gateway

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Storage configuration with backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Backend name: "mongo", "mysql", "postgres", "cassandra", "redis", "memory".
    /// `None` selects the default backend.
    #[serde(default)]
    pub backend: Option<String>,

    /// Upper bound for every backend call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub mongo: MongoConfig,
    #[serde(default)]
    pub mysql: MySqlConfig,
    #[serde(default)]
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub cassandra: CassandraConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: None,
            timeout_seconds: default_timeout(),
            mongo: MongoConfig::default(),
            mysql: MySqlConfig::default(),
            postgres: PostgresConfig::default(),
            cassandra: CassandraConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MongoConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_mongo_port")]
    pub port: u16,
    #[serde(default = "default_namespace")]
    pub database: String,
    #[serde(default = "default_table")]
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_mongo_port(),
            database: default_namespace(),
            collection: default_table(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MySqlConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
    #[serde(default = "default_mysql_user")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_namespace")]
    pub database: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_mysql_port(),
            username: default_mysql_user(),
            password: None,
            database: default_namespace(),
            table: default_table(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostgresConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    #[serde(default = "default_postgres_user")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Database to connect to; records live in `schema` inside it
    #[serde(default = "default_postgres_database")]
    pub database: String,
    #[serde(default = "default_namespace")]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_postgres_port(),
            username: default_postgres_user(),
            password: None,
            database: default_postgres_database(),
            schema: default_namespace(),
            table: default_table(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CassandraConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_cassandra_port")]
    pub port: u16,
    #[serde(default = "default_namespace")]
    pub keyspace: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_cassandra_port(),
            keyspace: default_namespace(),
            table: default_table(),
            replication_factor: default_replication_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// Redis list holding the JSON-encoded records
    #[serde(default = "default_table")]
    pub list_key: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_redis_port(),
            list_key: default_table(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,  // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String,  // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0:8080".to_string() }
fn default_timeout() -> u64 { 5 }
fn default_host() -> String { "localhost".to_string() }
fn default_namespace() -> String { "sensor_data_db".to_string() }
fn default_table() -> String { "sensor_data".to_string() }
fn default_mongo_port() -> u16 { 27017 }
fn default_mysql_port() -> u16 { 3306 }
fn default_postgres_port() -> u16 { 5432 }
fn default_cassandra_port() -> u16 { 9042 }
fn default_redis_port() -> u16 { 6379 }
fn default_mysql_user() -> String { "root".to_string() }
fn default_postgres_user() -> String { "postgres".to_string() }
fn default_postgres_database() -> String { "postgres".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_replication_factor() -> u32 { 1 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
