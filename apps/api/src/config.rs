//! API server configuration.
//!
//! Loaded once at startup from, in increasing precedence:
//!
//! ```text
//! built-in defaults  ──►  godown.toml (optional)  ──►  GODOWN_* environment
//! ```
//!
//! | Key                    | Env                           | Default                 |
//! |------------------------|-------------------------------|-------------------------|
//! | `host`                 | `GODOWN_HOST`                 | `0.0.0.0`               |
//! | `port`                 | `GODOWN_PORT`                 | `8000`                  |
//! | `database_path`        | `GODOWN_DATABASE_PATH`        | `./godown.db`           |
//! | `max_connections`      | `GODOWN_MAX_CONNECTIONS`      | `5`                     |
//! | `acquire_timeout_secs` | `GODOWN_ACQUIRE_TIMEOUT_SECS` | `10`                    |
//! | `allowed_origins`      | `GODOWN_ALLOWED_ORIGINS`      | local dev origins       |
//! | `frontend_url`         | `GODOWN_FRONTEND_URL`         | unset                   |
//! | `shortfall_policy`     | `GODOWN_SHORTFALL_POLICY`     | `reject`                |
//!
//! `GODOWN_ALLOWED_ORIGINS` is comma separated. `frontend_url`, when set, is
//! added to the allowed origins.

use std::time::Duration;

use axum::http::HeaderValue;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, Map};
use serde::Deserialize;

use godown_core::ShortfallPolicy;
use godown_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Upper bound on pooled database connections
    pub max_connections: u32,

    /// How long a request waits for a connection before failing
    pub acquire_timeout_secs: u64,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Deployed front-end origin (optional)
    pub frontend_url: Option<String>,

    /// What finalize does when stock cannot cover a line
    pub shortfall_policy: ShortfallPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_path: "./godown.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 10,
            allowed_origins: vec![
                "http://localhost:5500".to_string(),
                "http://127.0.0.1:5500".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
            frontend_url: None,
            shortfall_policy: ShortfallPolicy::Reject,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `godown.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("godown").required(false))
            .add_source(Self::environment(None));

        Self::from_builder(builder)
    }

    /// Defaults as a config layer, taken from [`ApiConfig::default`].
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let d = ApiConfig::default();
        let policy = match d.shortfall_policy {
            ShortfallPolicy::Reject => "reject",
            ShortfallPolicy::AllowNegative => "allow_negative",
            ShortfallPolicy::Backorder => "backorder",
        };

        Ok(Config::builder()
            .set_default("host", d.host)?
            .set_default("port", d.port as i64)?
            .set_default("database_path", d.database_path)?
            .set_default("max_connections", d.max_connections as i64)?
            .set_default("acquire_timeout_secs", d.acquire_timeout_secs as i64)?
            .set_default("allowed_origins", d.allowed_origins)?
            .set_default("shortfall_policy", policy)?)
    }

    /// `GODOWN_*` variables. `source` replaces the process environment.
    fn environment(source: Option<Map<String, String>>) -> Environment {
        Environment::with_prefix("GODOWN")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("allowed_origins")
            .source(source)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let mut config: ApiConfig = builder.build()?.try_deserialize()?;

        if let Some(url) = config.frontend_url.clone() {
            let url = url.trim_end_matches('/').to_string();
            if !url.is_empty() && !config.allowed_origins.contains(&url) {
                config.allowed_origins.push(url);
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                reason: "must not be empty".to_string(),
            });
        }
        for origin in &self.allowed_origins {
            let valid = (origin.starts_with("http://") || origin.starts_with("https://"))
                && HeaderValue::from_str(origin).is_ok();
            if !valid {
                return Err(ConfigError::InvalidValue {
                    key: "allowed_origins",
                    reason: format!("'{}' is not an http(s) origin", origin),
                });
            }
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed origins as header values for the CORS layer.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect()
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .shortfall_policy(self.shortfall_policy)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load_with(toml: &str, env: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let env: Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let builder = ApiConfig::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(ApiConfig::environment(Some(env)));
        ApiConfig::from_builder(builder)
    }

    #[test]
    fn test_defaults() {
        let config = load_with("", &[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Reject);
        assert_eq!(config.allowed_origins.len(), 3);
        assert!(config.frontend_url.is_none());
    }

    #[test]
    fn test_file_then_environment() {
        let toml = r#"
            port = 9000
            database_path = "/var/lib/godown/shop.db"
            shortfall_policy = "backorder"
        "#;
        let config = load_with(toml, &[("GODOWN_PORT", "9100")]).unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.database_path, "/var/lib/godown/shop.db");
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Backorder);
    }

    #[test]
    fn test_origins_list_and_frontend_url() {
        let config = load_with(
            "",
            &[
                ("GODOWN_ALLOWED_ORIGINS", "http://a.test,https://b.test"),
                ("GODOWN_FRONTEND_URL", "https://shop.example.com/"),
            ],
        )
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["http://a.test", "https://b.test", "https://shop.example.com"]
        );
        assert_eq!(config.cors_origins().len(), 3);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            load_with("max_connections = 0", &[]),
            Err(ConfigError::InvalidValue { key: "max_connections", .. })
        ));
        assert!(matches!(
            load_with(r#"allowed_origins = ["ftp://x"]"#, &[]),
            Err(ConfigError::InvalidValue { key: "allowed_origins", .. })
        ));
        assert!(matches!(
            load_with(r#"shortfall_policy = "sometimes""#, &[]),
            Err(ConfigError::Load(_))
        ));
    }
}
