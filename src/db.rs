use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use std::time::Duration;

/// Connection pool limits. Both timeouts must stay below the HTTP request
/// timeout so a saturated or stuck database surfaces as a store error.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
}

impl PoolSettings {
    /// `SET` statement applied to every new connection.
    fn statement_timeout_sql(&self) -> String {
        format!(
            "SET statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        )
    }
}

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let statement_timeout = settings.statement_timeout_sql();
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .after_connect(move |conn, _meta| {
                let statement_timeout = statement_timeout.clone();
                Box::pin(async move {
                    conn.execute(statement_timeout.as_str()).await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
