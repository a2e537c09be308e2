use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrewhouseConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl BrewhouseConfig {
    /// Check that the authorization settings can actually be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when no issuer, audience or
    /// JWKS URL can be resolved.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.resolved_issuer().is_none() {
            return Err(ConfigError::InvalidValue(
                "auth.issuer (or auth.domain) must be set".to_string(),
            ));
        }
        if self.auth.audience.is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.audience must be set".to_string(),
            ));
        }
        if self.auth.resolved_jwks_url().is_none() {
            return Err(ConfigError::InvalidValue(
                "auth.jwks_url (or auth.domain) must be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    pub metrics: MetricsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            metrics: MetricsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dsn: String,
    /// Drop, recreate and seed the drinks table on startup. Unset means off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_on_start: Option<bool>,
}

impl DatabaseConfig {
    pub fn resets_on_start(&self) -> bool {
        self.reset_on_start.unwrap_or(false)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite:brewhouse.db".to_string(),
            reset_on_start: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity provider tenant domain, e.g. `example.us.auth0.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub jwks_url: String,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_secs: u64,
    /// Age after which the cached key set is fetched again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_refresh_secs: Option<u64>,
}

impl AuthConfig {
    /// Explicit issuer, else `https://<domain>/`.
    pub fn resolved_issuer(&self) -> Option<String> {
        if !self.issuer.is_empty() {
            return Some(self.issuer.clone());
        }
        self.domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("https://{}/", d.trim_end_matches('/')))
    }

    /// Explicit JWKS URL, else `https://<domain>/.well-known/jwks.json`.
    pub fn resolved_jwks_url(&self) -> Option<String> {
        if !self.jwks_url.is_empty() {
            return Some(self.jwks_url.clone());
        }
        self.domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("https://{}/.well-known/jwks.json", d.trim_end_matches('/')))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            filter: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}
