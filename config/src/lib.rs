//! Brewhouse Configuration System
//!
//! YAML-based configuration for the brewhouse server.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/brewhouse/brewhouse.yaml` (system-wide)
//! 3. `~/.config/brewhouse/brewhouse.yaml` (user)
//! 4. `./brewhouse.yaml` (project-local)
//! 5. `BREWHOUSE_CONFIG=/path/to/config.yaml` (explicit)
//! 6. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! server:
//!   host: "0.0.0.0"
//!   port: 5000
//!
//! database:
//!   dsn: "sqlite:brewhouse.db"
//!
//! auth:
//!   domain: "${AUTH0_DOMAIN}"
//!   audience: "drinks"
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<BrewhouseConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<BrewhouseConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_yaml_shape() {
        let config = BrewhouseConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.dsn, "sqlite:brewhouse.db");
        assert_eq!(config.server.cors_origins, vec!["*"]);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = r"
server:
  port: 8080
";
        let config: BrewhouseConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0"); // default
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000
  cors_origins: ["https://shop.example.com"]

database:
  dsn: "sqlite::memory:"
  reset_on_start: true

auth:
  issuer: "https://tenant.example.com/"
  audience: "drinks"
  jwks_url: "https://tenant.example.com/.well-known/jwks.json"
  leeway_secs: 30
  jwks_refresh_secs: 3600

logging:
  level: debug
  format: json
"#;
        let config: BrewhouseConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(config.database.resets_on_start());
        assert_eq!(config.auth.audience, "drinks");
        assert_eq!(config.auth.leeway_secs, 30);
        assert_eq!(config.auth.jwks_refresh_secs, Some(3600));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }
}
