use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::PgPool;

pub const MIN_SECRET_LEN: usize = 32;

pub struct ValidationReport {
    pub environment: bool,
    pub database: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Database Connectivity: {}", status(self.database));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "✅ OK" } else { "❌ FAIL" }
}

pub async fn validate_environment(config: &Config, pool: &PgPool) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        environment: true,
        database: true,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = validate_database(pool).await {
        report.database = false;
        report.errors.push(format!("Database: {:#}", e));
    }

    Ok(report)
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if !(config.database_url.starts_with("postgres://")
        || config.database_url.starts_with("postgresql://"))
    {
        anyhow::bail!("DATABASE_URL must be a postgres:// URL");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }
    if config.db_max_connections == 0 {
        anyhow::bail!("DB_MAX_CONNECTIONS must be greater than 0");
    }
    if config.session_secret.len() < MIN_SECRET_LEN {
        anyhow::bail!("SESSION_SECRET must be at least {} bytes", MIN_SECRET_LEN);
    }
    if config.api_key_pepper.len() < MIN_SECRET_LEN {
        anyhow::bail!("API_KEY_PEPPER must be at least {} bytes", MIN_SECRET_LEN);
    }
    if let Some(origin) = config
        .cors_allowed_origins
        .iter()
        .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
    {
        anyhow::bail!("CORS_ALLOWED_ORIGINS entry '{}' is not an http(s) origin", origin);
    }

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    fn config() -> Config {
        Config {
            server_port: 3000,
            database_url: "postgres://localhost:5432/insureinfra".to_string(),
            db_max_connections: 5,
            session_secret: "s".repeat(MIN_SECRET_LEN),
            api_key_pepper: "p".repeat(MIN_SECRET_LEN),
            cors_allowed_origins: vec!["https://app.insureinfra.io".to_string()],
            log_request_body: false,
            log_format: LogFormat::Text,
            settlement_interval: None,
        }
    }

    #[test]
    fn test_validate_env_vars_accepts_sane_config() {
        assert!(validate_env_vars(&config()).is_ok());
    }

    #[test]
    fn test_validate_env_vars_non_postgres_url() {
        let config = Config {
            database_url: "mongodb://localhost:27017/insureinfra".to_string(),
            ..config()
        };
        assert!(validate_env_vars(&config).is_err());
    }

    #[test]
    fn test_validate_env_vars_short_secret() {
        let config = Config {
            session_secret: "short".to_string(),
            ..config()
        };
        let err = validate_env_vars(&config).unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn test_validate_env_vars_bad_origin() {
        let config = Config {
            cors_allowed_origins: vec!["app.insureinfra.io".to_string()],
            ..config()
        };
        assert!(validate_env_vars(&config).is_err());
    }
}
