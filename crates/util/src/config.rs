use std::{env, fmt, net::SocketAddr, num::ParseIntError, time::Duration};

use url::Url;

use super::server_bind_address;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:dayfinder.db?mode=rwc";
pub const DEFAULT_HISTORY_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_HISTORY_TIMEOUT_MS: u64 = 5000;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
    pub history_base_url: Url,
    pub history_timeout: Duration,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let history_raw = env::var("HISTORY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_HISTORY_BASE_URL.to_string());
        let history_base_url = Url::parse(&history_raw).map_err(ConfigError::HistoryBaseUrl)?;

        let timeout_ms = match env::var("HISTORY_TIMEOUT_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(ConfigError::HistoryTimeout)?,
            Err(_) => DEFAULT_HISTORY_TIMEOUT_MS,
        };

        Ok(Self {
            bind_addr,
            environment,
            database_url,
            history_base_url,
            history_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    HistoryBaseUrl(url::ParseError),
    HistoryTimeout(ParseIntError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::HistoryBaseUrl(err) => write!(f, "invalid HISTORY_BASE_URL value: {err}"),
            Self::HistoryTimeout(err) => write!(f, "invalid HISTORY_TIMEOUT_MS value: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}
