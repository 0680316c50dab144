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

// Sensor Gateway
//
// Accepts sensor readings over HTTP and persists them in one of several
// interchangeable databases:
// - A single `Record` shape with strict validation and one-decimal values
// - One storage adapter per engine behind the `StorageBackend` trait
// - Backend chosen by name at startup (`DATA_ACCESS`, `--backend` or config)
// - CSV reports that are identical whichever engine is selected

pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod server;
pub mod service;
pub mod storage;

// Re-export main types
pub use config::{load_config, load_config_or_default, load_config_with_env, GatewayConfig};
pub use error::{Error, Result};
pub use record::Record;
pub use report::render_csv;
pub use service::IngestionService;
pub use storage::{BackendKind, StorageBackend, StorageGateway};
