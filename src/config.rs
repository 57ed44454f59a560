use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub readiness_timeout: Duration,
    pub startup_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            readiness_timeout: secs_from_env("READINESS_TIMEOUT_SECS", 5)?,
            startup_timeout: secs_from_env("STARTUP_TIMEOUT_SECS", 10)?,
        })
    }
}

/// Health check bounds. `Default` is used when the service is wired without
/// environment config.
#[derive(Debug, Clone, Copy)]
pub struct HealthTimeouts {
    pub readiness: Duration,
    pub startup: Duration,
}

impl Default for HealthTimeouts {
    fn default() -> Self {
        Self {
            readiness: Duration::from_secs(5),
            startup: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for HealthTimeouts {
    fn from(config: &Config) -> Self {
        Self {
            readiness: config.readiness_timeout,
            startup: config.startup_timeout,
        }
    }
}

fn secs_from_env(key: &str, default: u64) -> anyhow::Result<Duration> {
    let secs: u64 = match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}
