//! Configuration types.
//!
//! Built once at startup from the environment and handed to the components
//! that need it. Nothing reads the environment after `main`.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// What `GET /todo` does when the filter matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyListPolicy {
    /// Respond 404, as if the collection were a missing resource.
    #[default]
    NotFound,
    /// Respond 204 with no body.
    NoContent,
    /// Respond 200 with `{"items": [], "total_items": 0}`.
    EmptyPage,
}

impl FromStr for EmptyListPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_found" => Ok(Self::NotFound),
            "no_content" => Ok(Self::NoContent),
            "empty_page" => Ok(Self::EmptyPage),
            other => Err(format!(
                "unknown policy '{other}' (expected not_found, no_content or empty_page)"
            )),
        }
    }
}

/// Store connection parameters.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file, or `:memory:`.
    pub path: String,
    /// Upper bound on a single repository call.
    pub query_timeout: Duration,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Requests running longer than this are answered with 408.
    pub request_timeout: Duration,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
}

/// Whole-application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment level (`development`, `production`, `test`, ...). Logged only.
    pub app_level: String,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub empty_list: EmptyListPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_level: "development".to_string(),
            database: DatabaseConfig {
                path: "./data/todo-list.db".to_string(),
                query_timeout: Duration::from_secs(5),
            },
            server: ServerConfig {
                addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
                request_timeout: Duration::from_secs(5),
                shutdown_grace: Duration::from_secs(5),
            },
            empty_list: EmptyListPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let app_level = lookup("APP_LEVEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.app_level);

        let path = lookup("TODO_DB_PATH")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.database.path);

        let query_timeout = secs(&lookup, "TODO_QUERY_TIMEOUT_SECS")?
            .unwrap_or(defaults.database.query_timeout);

        let addr = match lookup("TODO_HTTP_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "TODO_HTTP_ADDR".to_string(),
                message: format!("{e}"),
            })?,
            None => defaults.server.addr,
        };

        let request_timeout = secs(&lookup, "TODO_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(defaults.server.request_timeout);

        let shutdown_grace = secs(&lookup, "TODO_SHUTDOWN_GRACE_SECS")?
            .unwrap_or(defaults.server.shutdown_grace);

        let empty_list = match lookup("TODO_EMPTY_LIST_POLICY") {
            Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "TODO_EMPTY_LIST_POLICY".to_string(),
                message,
            })?,
            None => defaults.empty_list,
        };

        Ok(Self {
            app_level,
            database: DatabaseConfig {
                path,
                query_timeout,
            },
            server: ServerConfig {
                addr,
                request_timeout,
                shutdown_grace,
            },
            empty_list,
        })
    }
}

/// Parse an optional whole-second duration. Zero is rejected.
fn secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{e}"),
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(Some(Duration::from_secs(value)))
}
