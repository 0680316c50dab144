// Configuration module for sensor-gateway
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Environment overrides (DATA_ACCESS, <ENGINE>_HOST, <ENGINE>_PORT)
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Path used when no configuration file is given explicitly
pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

/// Environment variable selecting the storage backend
pub const BACKEND_ENV: &str = "DATA_ACCESS";

/// Environment variable overriding the HTTP listen address
pub const BIND_ENV: &str = "SENSOR_GATEWAY_BIND";

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<GatewayConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load `path` if given, else the default file if present, else built-in defaults.
/// Environment overrides apply in every case.
pub fn load_config_or_default(path: Option<&Path>) -> Result<GatewayConfig> {
    match path {
        Some(path) => load_config_with_env(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config_with_env(DEFAULT_CONFIG_PATH),
        None => {
            let mut config = GatewayConfig::default();
            apply_env_overrides(&mut config)?;
            Ok(config)
        }
    }
}

/// Allow environment variables to override config values
pub fn apply_env_overrides(config: &mut GatewayConfig) -> Result<()> {
    if let Ok(backend) = std::env::var(BACKEND_ENV) {
        config.storage.backend = Some(backend);
    }

    if let Ok(bind) = std::env::var(BIND_ENV) {
        config.server.bind_address = bind;
    }

    let storage = &mut config.storage;
    override_endpoint("MONGO", &mut storage.mongo.host, &mut storage.mongo.port)?;
    override_endpoint("MYSQL", &mut storage.mysql.host, &mut storage.mysql.port)?;
    override_endpoint("POSTGRES", &mut storage.postgres.host, &mut storage.postgres.port)?;
    override_endpoint("CASSANDRA", &mut storage.cassandra.host, &mut storage.cassandra.port)?;
    override_endpoint("REDIS", &mut storage.redis.host, &mut storage.redis.port)?;

    ConfigLoader::validate(config)
}

fn override_endpoint(prefix: &str, host: &mut String, port: &mut u16) -> Result<()> {
    if let Ok(value) = std::env::var(format!("{}_HOST", prefix)) {
        *host = value;
    }

    let port_var = format!("{}_PORT", prefix);
    if let Ok(value) = std::env::var(&port_var) {
        *port = value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a port number, got '{}'", port_var, value))?;
    }

    Ok(())
}
