use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tjm_core::AppError;

use crate::config::DatabaseConfig;
use crate::offer_repository::OfferRepository;

/// Owns the connection pool, runs migrations, and vends the offer store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Build a pool without opening a connection. Connection problems
    /// surface on the first health check, not at startup.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy(&config.url)
            .map_err(|e| AppError::ConfigError(format!("Invalid DATABASE_URL: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    pub fn offers(&self) -> OfferRepository {
        OfferRepository::new(self.pool.clone())
    }
}
