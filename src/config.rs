use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub session_secret: String,
    pub api_key_pepper: String,
    pub cors_allowed_origins: Vec<String>,
    pub log_request_body: bool,
    pub log_format: LogFormat,
    pub settlement_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        let settlement_interval = match lookup("SETTLEMENT_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .context("SETTLEMENT_INTERVAL_SECS must be a number of seconds")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Config {
            server_port: lookup("SERVER_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            session_secret: required("SESSION_SECRET")?,
            api_key_pepper: required("API_KEY_PEPPER")?,
            cors_allowed_origins: parse_origins(
                &lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            log_request_body: lookup("LOG_REQUEST_BODY")
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(false),
            log_format: parse_log_format(lookup("LOG_FORMAT").as_deref()),
            settlement_interval,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
