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

// Storage backend module
//
// One trait with an adapter per database engine. The gateway picks the
// adapter by name; callers only ever see `Arc<dyn StorageBackend>`.

pub mod backend;
pub mod cassandra;
pub mod gateway;
pub mod memory;
pub mod mongo;
pub mod mysql;
pub mod postgres;
pub mod redis;
mod sql;

pub use backend::StorageBackend;
pub use cassandra::CassandraBackend;
pub use gateway::{BackendKind, StorageGateway};
pub use memory::MemoryBackend;
pub use mongo::MongoBackend;
pub use mysql::MySqlBackend;
pub use postgres::PostgresBackend;
pub use redis::RedisBackend;
