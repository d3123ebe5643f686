use crate::app::REQUEST_TIMEOUT;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub store_timeout_secs: u64,
    pub audit_channel_capacity: usize,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Database host: {}", database_host_for_log(&config.database_url));
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("DB max connections: {}", config.db_max_connections);
        tracing::debug!(
            "DB acquire timeout: {}s, store timeout: {}s",
            config.db_acquire_timeout_secs,
            config.store_timeout_secs
        );
        tracing::debug!("Audit channel capacity: {}", config.audit_channel_capacity);

        Ok(config)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    /// Deadline for one store call; also used as the SQL statement timeout.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: lookup("DB_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .ok_or_else(|| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .ok()
                .filter(|n: &u32| *n >= 1)
                .ok_or_else(|| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a positive number"))?,
            db_acquire_timeout_secs: lookup("DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .ok()
                .filter(|n: &u64| *n >= 1 && *n < REQUEST_TIMEOUT.as_secs())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "DB_ACQUIRE_TIMEOUT_SECS must be between 1 and {}",
                        REQUEST_TIMEOUT.as_secs() - 1
                    )
                })?,
            store_timeout_secs: lookup("STORE_TIMEOUT_SECS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .ok()
                .filter(|n: &u64| *n >= 1 && *n < REQUEST_TIMEOUT.as_secs())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "STORE_TIMEOUT_SECS must be between 1 and {}",
                        REQUEST_TIMEOUT.as_secs() - 1
                    )
                })?,
            audit_channel_capacity: lookup("AUDIT_CHANNEL_CAPACITY")
                .unwrap_or_else(|| "1024".to_string())
                .parse()
                .ok()
                .filter(|n: &usize| *n >= 1)
                .ok_or_else(|| {
                    anyhow::anyhow!("AUDIT_CHANNEL_CAPACITY must be a positive number")
                })?,
            run_migrations: lookup("RUN_MIGRATIONS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(false),
        })
    }
}

/// Host part of a database URL, for logs. Credentials are never included.
fn database_host_for_log(database_url: &str) -> String {
    url::Url::parse(database_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "<unparseable>".to_string())
}
