// Configuration loader with environment variable substitution

use super::types::*;
use crate::storage::BackendKind;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<GatewayConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    /// Parse YAML configuration text with environment variable substitution
    pub fn parse(content: &str) -> Result<GatewayConfig> {
        // Substitute environment variables
        let content = Self::substitute_env_vars(content)?;

        // Parse YAML
        let config: GatewayConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        // Validate configuration
        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${MONGO_HOST} -> db.internal
    /// - ${DATA_ACCESS:-mongo} -> mongo (if DATA_ACCESS not set)
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}")
            .context("Invalid substitution pattern")?;

        let substituted = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if let Some(default) = default_value {
                        default.to_string()
                    } else {
                        // Keep original if no default and var not found
                        format!("${{{}}}", var_name)
                    }
                }
            }
        });

        Ok(substituted.to_string())
    }

    /// Validate configuration
    pub(crate) fn validate(config: &GatewayConfig) -> Result<()> {
        let storage = &config.storage;

        if storage.timeout_seconds == 0 {
            bail!("storage.timeout_seconds must be > 0");
        }

        // Validate backend
        if let Some(name) = storage.backend.as_deref().filter(|n| !n.trim().is_empty()) {
            if let Err(e) = name.parse::<BackendKind>() {
                bail!("{}", e);
            }
        }

        // Names end up inside DDL and queries, so restrict them to plain identifiers
        let identifiers = [
            ("storage.mongo.database", &storage.mongo.database),
            ("storage.mongo.collection", &storage.mongo.collection),
            ("storage.mysql.database", &storage.mysql.database),
            ("storage.mysql.table", &storage.mysql.table),
            ("storage.postgres.schema", &storage.postgres.schema),
            ("storage.postgres.table", &storage.postgres.table),
            ("storage.cassandra.keyspace", &storage.cassandra.keyspace),
            ("storage.cassandra.table", &storage.cassandra.table),
            ("storage.redis.list_key", &storage.redis.list_key),
        ];
        for (field, value) in identifiers {
            if !is_identifier(value) {
                bail!("{} must be a plain identifier, got '{}'", field, value);
            }
        }

        let ports = [
            ("storage.mongo.port", storage.mongo.port),
            ("storage.mysql.port", storage.mysql.port),
            ("storage.postgres.port", storage.postgres.port),
            ("storage.cassandra.port", storage.cassandra.port),
            ("storage.redis.port", storage.redis.port),
        ];
        for (field, port) in ports {
            if port == 0 {
                bail!("{} must be > 0", field);
            }
        }

        if storage.mysql.max_connections == 0 || storage.postgres.max_connections == 0 {
            bail!("max_connections must be > 0");
        }

        if storage.cassandra.replication_factor == 0 {
            bail!("storage.cassandra.replication_factor must be > 0");
        }

        if config.server.bind_address.trim().is_empty() {
            bail!("server.bind_address cannot be empty");
        }

        match config.logging.format.as_str() {
            "text" | "json" => {}
            other => bail!("logging.format must be 'text' or 'json', got '{}'", other),
        }

        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        // Set test environment variable
        std::env::set_var("SG_TEST_VAR", "test_value");

        let input = "host: ${SG_TEST_VAR}";
        let output = ConfigLoader::substitute_env_vars(input).unwrap();
        assert_eq!(output, "host: test_value");

        std::env::remove_var("SG_TEST_VAR");
    }

    #[test]
    fn test_env_var_with_default() {
        // Don't set SG_TEST_VAR2
        std::env::remove_var("SG_TEST_VAR2");

        let input = "backend: ${SG_TEST_VAR2:-redis}";
        let output = ConfigLoader::substitute_env_vars(input).unwrap();
        assert_eq!(output, "backend: redis");
    }

    #[test]
    fn test_unset_var_without_default_is_kept() {
        std::env::remove_var("SG_TEST_VAR3");

        let output = ConfigLoader::substitute_env_vars("host: ${SG_TEST_VAR3}").unwrap();
        assert_eq!(output, "host: ${SG_TEST_VAR3}");
    }

    #[test]
    fn test_validation_default_config() {
        assert!(ConfigLoader::validate(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut config = GatewayConfig::default();
        config.storage.timeout_seconds = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_validation_unknown_backend() {
        let mut config = GatewayConfig::default();
        config.storage.backend = Some("couchdb".to_string());

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown storage backend"));
    }

    #[test]
    fn test_validation_rejects_unsafe_identifier() {
        let mut config = GatewayConfig::default();
        config.storage.mysql.table = "sensor_data; DROP TABLE users".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("storage.mysql.table"));
    }

    #[test]
    fn test_validation_log_format() {
        let mut config = GatewayConfig::default();
        config.logging.format = "xml".to_string();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("sensor_data"));
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1table"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
