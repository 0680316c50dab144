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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensor_gateway::config::{load_config_or_default, LoggingConfig};
use sensor_gateway::{server, IngestionService, StorageGateway};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Sensor Gateway - store sensor readings in a pluggable database backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to config/default.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage backend (overrides DATA_ACCESS and the config file)
    #[arg(short, long)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listen address, e.g. 0.0.0.0:8080
        #[arg(long)]
        bind: Option<String>,
    },
    /// Store the reference and a random reading, print the CSV report, then purge
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config_or_default(args.config.as_deref())?;
    if let Some(backend) = args.backend {
        config.storage.backend = Some(backend);
    }

    init_tracing(&config.logging)?;

    info!("Starting Sensor Gateway v{}", env!("CARGO_PKG_VERSION"));

    let backend = StorageGateway::from_config(&config.storage)
        .context("Failed to create storage backend")?;
    let service = Arc::new(IngestionService::new(backend));

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            // Unreachable engines are not fatal; requests report them as 503
            if let Err(e) = service.ensure_schema().await {
                warn!("Schema setup failed on {}: {}", service.backend_type(), e);
            }
            let bind = bind.unwrap_or(config.server.bind_address);
            server::serve(&bind, service).await?;
        }
        Command::Demo => {
            println!("{}", service.demo("den").await?);
            info!("Demo complete");
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid logging.level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
