use crate::{BrewhouseConfig, ConfigError};
use regex::Regex;
use std::path::{Path, PathBuf};

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/brewhouse/brewhouse.yaml"));
        }
        search_paths.push(PathBuf::from("./brewhouse.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/brewhouse/brewhouse.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the default search paths; later paths override earlier ones.
    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<BrewhouseConfig, ConfigError> {
        let mut config = BrewhouseConfig::default();

        let explicit = std::env::var("BREWHOUSE_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.explicit_file.clone());

        if let Some(path) = explicit {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFile { path: path.clone(), source: e })?;
            config = self.parse_yaml(&content)?;
            tracing::debug!(path = %path.display(), "Loaded config file");
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        config = self.merge_yaml(&config, &content)?;
                        tracing::debug!(path = %path.display(), "Merged config file");
                    }
                }
            }
        }

        self.apply_env_overrides(&mut config);
        Ok(config)
    }

    fn parse_yaml(&self, content: &str) -> Result<BrewhouseConfig, ConfigError> {
        let expanded = self.expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(
        &self,
        base: &BrewhouseConfig,
        content: &str,
    ) -> Result<BrewhouseConfig, ConfigError> {
        let overlay = self.parse_yaml(content)?;
        Ok(Self::merge_configs(base, &overlay))
    }

    fn merge_configs(base: &BrewhouseConfig, overlay: &BrewhouseConfig) -> BrewhouseConfig {
        let defaults = BrewhouseConfig::default();
        let mut result = base.clone();

        if overlay.server.host != defaults.server.host {
            result.server.host.clone_from(&overlay.server.host);
        }
        if overlay.server.port != defaults.server.port {
            result.server.port = overlay.server.port;
        }
        if overlay.server.cors_origins != defaults.server.cors_origins {
            result.server.cors_origins.clone_from(&overlay.server.cors_origins);
        }
        if overlay.server.metrics.enabled != defaults.server.metrics.enabled
            || overlay.server.metrics.path != defaults.server.metrics.path
        {
            result.server.metrics = overlay.server.metrics.clone();
        }
        if overlay.database.dsn != defaults.database.dsn {
            result.database.dsn.clone_from(&overlay.database.dsn);
        }
        if overlay.database.reset_on_start.is_some() {
            result.database.reset_on_start = overlay.database.reset_on_start;
        }
        if overlay.auth.domain.is_some() {
            result.auth.domain.clone_from(&overlay.auth.domain);
        }
        if !overlay.auth.issuer.is_empty() {
            result.auth.issuer.clone_from(&overlay.auth.issuer);
        }
        if !overlay.auth.audience.is_empty() {
            result.auth.audience.clone_from(&overlay.auth.audience);
        }
        if !overlay.auth.jwks_url.is_empty() {
            result.auth.jwks_url.clone_from(&overlay.auth.jwks_url);
        }
        if overlay.auth.leeway_secs != defaults.auth.leeway_secs {
            result.auth.leeway_secs = overlay.auth.leeway_secs;
        }
        if overlay.auth.jwks_refresh_secs.is_some() {
            result.auth.jwks_refresh_secs = overlay.auth.jwks_refresh_secs;
        }
        if overlay.logging.level != defaults.logging.level
            || overlay.logging.format != defaults.logging.format
            || !overlay.logging.filter.is_empty()
        {
            result.logging = overlay.logging.clone();
        }

        result
    }

    fn expand_env_vars(&self, content: &str) -> String {
        let Ok(re) = Regex::new(r"\$\{([^}]+)\}") else {
            return content.to_string();
        };
        re.replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .to_string()
    }

    fn apply_env_overrides(&self, config: &mut BrewhouseConfig) {
        if let Ok(host) = std::env::var("BREWHOUSE_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("BREWHOUSE_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Ok(dsn) = std::env::var("BREWHOUSE_DATABASE_URL") {
            if !dsn.is_empty() {
                config.database.dsn = dsn;
            }
        }
        if let Ok(domain) = std::env::var("AUTH0_DOMAIN") {
            if !domain.is_empty() {
                config.auth.domain = Some(domain);
            }
        }
        if let Ok(issuer) = std::env::var("BREWHOUSE_AUTH_ISSUER") {
            config.auth.issuer = issuer;
        }
        if let Some(audience) = std::env::var("BREWHOUSE_AUTH_AUDIENCE")
            .ok()
            .or_else(|| std::env::var("API_AUDIENCE").ok())
        {
            config.auth.audience = audience;
        }
        if let Ok(url) = std::env::var("BREWHOUSE_JWKS_URL") {
            config.auth.jwks_url = url;
        }
        if let Ok(level) = std::env::var("BREWHOUSE_LOG_LEVEL") {
            if let Ok(l) = serde_yaml::from_str(&level) {
                config.logging.level = l;
            }
        }
    }
}
