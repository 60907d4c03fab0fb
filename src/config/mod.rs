//! Configuration loading and management

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pagination defaults applied by the REST layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when a read request does not give one
    pub default_page_size: i64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
        }
    }
}

/// Longest token lifetime `validate` accepts, one leap year
pub const MAX_EXPIRY_HOURS: i64 = 24 * 366;

/// Token signing settings for the login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub valid_issuer: String,
    pub valid_audience: String,
    /// Token lifetime in hours
    pub expiry_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            valid_issuer: "anycrud".to_string(),
            valid_audience: "anycrud".to_string(),
            expiry_hours: 3,
        }
    }
}

/// Per-type exposure override
///
/// Lets a deployment switch off the generic handler of a type whose
/// `expose` marker is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Type name as returned by `Entity::type_name()`
    pub name: String,

    #[serde(default = "default_expose")]
    pub expose: bool,
}

fn default_expose() -> bool {
    true
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paging: PagingConfig,
    pub jwt: JwtConfig,
    pub entities: Vec<EntityConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.default_page_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "paging.default_page_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(1..=MAX_EXPIRY_HOURS).contains(&self.jwt.expiry_hours) {
            return Err(ConfigError::InvalidValue {
                field: "jwt.expiry_hours".to_string(),
                message: format!("must be between 1 and {}", MAX_EXPIRY_HOURS),
            });
        }
        Ok(())
    }

    /// Whether `type_name` may be exposed; types without an entry always are
    pub fn is_exposed(&self, type_name: &str) -> bool {
        self.entities
            .iter()
            .find(|e| e.name == type_name)
            .is_none_or(|e| e.expose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.address(), "127.0.0.1:3000");
        assert_eq!(config.paging.default_page_size, 10);
        assert_eq!(config.jwt.expiry_hours, 3);
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            r#"
server:
  port: 8080
jwt:
  secret: "s3cr3t"
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jwt.secret, "s3cr3t");
        assert_eq!(config.jwt.valid_issuer, "anycrud");
        assert_eq!(config.paging.default_page_size, 10);
    }

    #[test]
    fn test_entity_overrides() {
        let config = AppConfig::from_yaml_str(
            r#"
entities:
  - name: Role
    expose: false
  - name: Widget
"#,
        )
        .unwrap();

        assert!(!config.is_exposed("Role"));
        assert!(config.is_exposed("Widget"));
        assert!(config.is_exposed("User"));
    }

    #[test]
    fn test_invalid_page_size_rejected() {
        let err = AppConfig::from_yaml_str("paging:\n  default_page_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "paging.default_page_size"));
    }

    #[test]
    fn test_expiry_bounds() {
        let at_limit = format!("jwt:\n  expiry_hours: {}\n", MAX_EXPIRY_HOURS);
        assert!(AppConfig::from_yaml_str(&at_limit).is_ok());

        let over = format!("jwt:\n  expiry_hours: {}\n", i64::MAX);
        let err = AppConfig::from_yaml_str(&over).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "jwt.expiry_hours"));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = AppConfig::from_yaml_str("server: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_yaml_serialization() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
