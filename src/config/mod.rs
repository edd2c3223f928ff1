use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable is not set: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// An unset `APP_ENV` means production; unrecognised values mean development.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            Some(_) => Environment::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(env::var("APP_ENV").ok().as_deref())
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
}

/// Tokens are valid for one day; not configurable.
pub const JWT_EXPIRY_HOURS: i64 = 24;

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(lookup("APP_ENV").as_deref());
        let source = Source { lookup: &lookup };

        let (max_connections, connection_timeout) = match environment {
            Environment::Development => (10, 30),
            Environment::Staging => (20, 10),
            Environment::Production => (50, 5),
        };

        let config = Self {
            environment,
            server: ServerConfig {
                port: source.parsed("SERVER_PORT", 8080)?,
                shutdown_timeout_secs: source.parsed("SERVER_SHUTDOWN_TIMEOUT_SECS", 5)?,
            },
            database: DatabaseConfig {
                user: source.required("POSTGRES_USER")?,
                password: source.required("POSTGRES_PASSWORD")?,
                host: source.required("POSTGRES_HOST")?,
                port: source.parsed("POSTGRES_PORT", 5432)?,
                name: source.required("POSTGRES_DB")?,
                max_connections: source.parsed("DATABASE_MAX_CONNECTIONS", max_connections)?,
                connection_timeout: source.parsed("DATABASE_CONNECTION_TIMEOUT", connection_timeout)?,
            },
            security: SecurityConfig {
                jwt_secret: source.required("JWT_SECRET")?,
                jwt_expiry_hours: JWT_EXPIRY_HOURS,
                bcrypt_cost: source.parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
        };

        if !(4..=31).contains(&config.security.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: config.security.bcrypt_cost.to_string(),
            });
        }

        Ok(config)
    }
}

struct Source<'a, F> {
    lookup: &'a F,
}

impl<F> Source<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        match (self.lookup)(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::Missing(key)),
        }
    }

    fn parsed<T: std::str::FromStr + std::fmt::Display>(
        &self,
        key: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        match (self.lookup)(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => {
                tracing::debug!(key, default = %default, "Using default value for env variable");
                Ok(default)
            }
        }
    }
}
