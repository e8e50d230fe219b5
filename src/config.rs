//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Public base URL that profile asset paths are joined onto
    pub base_url: String,

    /// Period of the scheduled counter sweep
    pub reconcile_interval: Duration,

    /// Users per reconcile page
    pub reconcile_page_size: i64,

    /// Deadline for one user's reconcile
    pub reconcile_timeout: Duration,

    /// Parallel reconciles within a page
    pub reconcile_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "10")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let log_format = parse_var("LOG_FORMAT", "pretty")?;

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        // tokio's interval panics on a zero period
        let reconcile_interval =
            Duration::from_secs(parse_positive("RECONCILE_INTERVAL_SECS", "300")?);

        let reconcile_page_size: i64 = parse_positive("RECONCILE_PAGE_SIZE", "100")?;

        let reconcile_timeout = Duration::from_millis(parse_var("RECONCILE_TIMEOUT_MS", "5000")?);

        let reconcile_concurrency: usize = parse_positive("RECONCILE_CONCURRENCY", "8")?;

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            log_format,
            base_url,
            reconcile_interval,
            reconcile_page_size,
            reconcile_timeout,
            reconcile_concurrency,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name))
}

/// Like [`parse_var`], but zero and negative values are rejected
fn parse_positive<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let value: T = parse_var(name, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue(name));
    }
    Ok(value)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(ConfigError::InvalidValue("LOG_FORMAT"))
        ));
    }

    #[test]
    fn test_parse_var_default() {
        let value: u64 = parse_var("FILM_SOCIAL_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(value, 42);

        let err = parse_var::<u64>("FILM_SOCIAL_TEST_UNSET_VARIABLE", "forty-two").unwrap_err();
        assert!(err.to_string().contains("FILM_SOCIAL_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn test_parse_positive_rejects_zero_and_negative() {
        env::set_var("FILM_SOCIAL_TEST_ZERO", "0");
        env::set_var("FILM_SOCIAL_TEST_NEGATIVE", "-5");

        assert!(matches!(
            parse_positive::<u64>("FILM_SOCIAL_TEST_ZERO", "300"),
            Err(ConfigError::InvalidValue("FILM_SOCIAL_TEST_ZERO"))
        ));
        assert!(matches!(
            parse_positive::<i64>("FILM_SOCIAL_TEST_NEGATIVE", "100"),
            Err(ConfigError::InvalidValue("FILM_SOCIAL_TEST_NEGATIVE"))
        ));
        assert_eq!(
            parse_positive::<u64>("FILM_SOCIAL_TEST_UNSET_POSITIVE", "300").unwrap(),
            300
        );
    }

    // The only test in this binary that touches the RECONCILE_* variables
    #[test]
    fn test_zero_reconcile_interval_is_rejected() {
        env::set_var("DATABASE_URL", "postgres://localhost/film_social_test");
        env::set_var("RECONCILE_INTERVAL_SECS", "0");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue("RECONCILE_INTERVAL_SECS")
        ));

        env::set_var("RECONCILE_INTERVAL_SECS", "60");
        let config = Config::from_env().unwrap();
        assert_eq!(config.reconcile_interval, Duration::from_secs(60));

        env::remove_var("RECONCILE_INTERVAL_SECS");
    }
}
