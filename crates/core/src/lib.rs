pub mod analytics;
pub mod domain;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    const DEFAULT_PORT: u16 = 3000;
    const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
        pub db_max_connections: u32,
        pub cors_allow_origin: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port: parse_env("PORT")?.unwrap_or(DEFAULT_PORT),
                db_max_connections: parse_env("DB_MAX_CONNECTIONS")?
                    .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
                cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub async fn connect_pool(&self) -> anyhow::Result<sqlx::PgPool> {
            let db_url = self.require_database_url()?;
            sqlx::postgres::PgPoolOptions::new()
                .max_connections(self.db_max_connections)
                .connect(db_url)
                .await
                .context("connect DATABASE_URL failed")
        }
    }

    fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("{key} is not valid: {raw}")),
            _ => Ok(None),
        }
    }
}
